//! Error taxonomy for target resolution and session lifecycle

use thiserror::Error;

/// Errors surfaced by the resolution, brokering, and transport layers.
///
/// Resolution-layer errors bubble unmodified to the command layer for
/// display; only best-effort session-close failures after a completed
/// transport run are logged instead of raised.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid exec argument: {0}")]
    InvalidCommand(String),

    #[error("region is not set")]
    MissingRegion,

    #[error("target is not set")]
    MissingTarget,

    #[error("control plane lookup failed: {0}")]
    LookupFailed(String),

    #[error("no selection made")]
    NoSelectionMade,

    #[error("no running instances in region {0}")]
    NoRunningInstances(String),

    #[error("failed to open session: {0}")]
    SessionOpenFailed(String),

    #[error("failed to close session: {0}")]
    SessionCloseFailed(String),

    #[error("transport process failed: {0}")]
    TransportFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type GateResult<T> = Result<T, GateError>;
