//! Session brokering
//!
//! Opens and closes time-bounded sessions against a resolved target. Both
//! calls are independent network round-trips bounded by explicit deadlines;
//! a deadline expiry is terminal for that call, never a retry trigger
//! (remote broker state is unknown after a timeout, so a blind retry risks
//! duplicate sessions).

use std::time::Duration;

use colored::Colorize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::aws::ControlPlane;
use crate::error::{GateError, GateResult};

/// Deadline for the session-start round-trip.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(15);

/// Deadline for the session-terminate round-trip.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// A negotiated session, owned by the caller until handed to the transport
/// process and then back to [`SessionBroker::close`].
///
/// All values are opaque pass-through; the broker never inspects them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHandle {
    pub session_id: String,
    pub stream_url: String,
    pub token_value: String,
    pub region: String,
}

impl SessionHandle {
    /// Positional arguments for the delegated transport executable, in the
    /// session-manager-plugin wire order: JSON session blob, region,
    /// "StartSession", profile, JSON target parameters, service endpoint.
    pub fn plugin_args(&self, profile: &str, target: &str, endpoint: &str) -> Vec<String> {
        let session = serde_json::json!({
            "SessionId": self.session_id,
            "StreamUrl": self.stream_url,
            "TokenValue": self.token_value,
        });
        let parameters = serde_json::json!({ "Target": target });

        vec![
            session.to_string(),
            self.region.clone(),
            "StartSession".to_string(),
            profile.to_string(),
            parameters.to_string(),
            endpoint.to_string(),
        ]
    }
}

/// Opens and closes sessions through the control plane.
pub struct SessionBroker<'a> {
    control_plane: &'a dyn ControlPlane,
}

impl<'a> SessionBroker<'a> {
    pub fn new(control_plane: &'a dyn ControlPlane) -> Self {
        Self { control_plane }
    }

    /// Negotiate a session against `target`, bounded by [`OPEN_TIMEOUT`].
    pub async fn open(&self, region: &str, target: &str) -> GateResult<SessionHandle> {
        info!("opening session against {} in {}", target, region);

        let ticket = timeout(OPEN_TIMEOUT, self.control_plane.start_session(region, target))
            .await
            .map_err(|_| {
                GateError::SessionOpenFailed(format!(
                    "timed out after {}s",
                    OPEN_TIMEOUT.as_secs()
                ))
            })??;

        debug!("session {} opened", ticket.session_id);
        Ok(SessionHandle {
            session_id: ticket.session_id,
            stream_url: ticket.stream_url,
            token_value: ticket.token_value,
            region: region.to_string(),
        })
    }

    /// Terminate `session_id`, bounded by [`CLOSE_TIMEOUT`].
    ///
    /// Best-effort by policy: the caller logs a failure after a completed
    /// transport run instead of escalating it, since the remote side may
    /// already have reaped the session.
    pub async fn close(&self, region: &str, session_id: &str) -> GateResult<()> {
        info!("closing session {}", session_id);

        timeout(
            CLOSE_TIMEOUT,
            self.control_plane.terminate_session(region, session_id),
        )
        .await
        .map_err(|_| {
            GateError::SessionCloseFailed(format!(
                "timed out after {}s",
                CLOSE_TIMEOUT.as_secs()
            ))
        })?
    }
}

/// Run the transport process for an open session and close the session
/// exactly once afterwards, no matter how the transport exits.
///
/// A close failure after a completed run is logged and reported, never
/// escalated; the transport outcome is what propagates.
pub async fn run_transport(
    broker: &SessionBroker<'_>,
    handle: &SessionHandle,
    executable: &str,
    args: &[String],
) -> GateResult<()> {
    let transport_result = crate::runner::run(executable, args).await;

    println!(
        "{} {}",
        "Delete Session".yellow(),
        handle.session_id.yellow()
    );
    if let Err(err) = broker.close(&handle.region, &handle.session_id).await {
        warn!("failed to close session {}: {}", handle.session_id, err);
    }

    transport_result
}
