//! ssmgate library
//!
//! Resolves an EC2 target from partial ssh/scp connection information,
//! brokers a time-bounded SSM session against it, and delegates the data
//! transport to the external session-manager-plugin process.

pub mod aws;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod prompt;
pub mod resolve;
pub mod runner;
pub mod session;

use anyhow::Result;

/// Application result type for consistent error handling
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize tracing subscriber for logging
pub fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ssmgate={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
