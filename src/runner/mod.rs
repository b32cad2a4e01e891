//! Delegated transport process runner
//!
//! Runs the external transport executable with its stdio wired straight
//! through to ours. While the child is alive, SIGINT delivered to this
//! process is drained and discarded so that an interactive Ctrl-C reaches
//! only the child (or the remote session) and never kills the orchestrator
//! before cleanup runs. The draining task is bound to the child's lifetime
//! through a write-once completion channel and joined before `run`
//! returns on every exit path.

use std::process::Stdio;

use tokio::process::Command;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{GateError, GateResult};

/// Run the transport executable to completion.
///
/// Returns `TransportFailed` on a non-zero exit; the caller still proceeds
/// to session cleanup regardless of the outcome.
pub async fn run(executable: &str, args: &[String]) -> GateResult<()> {
    debug!("spawning transport process {}", executable);

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;

    let mut interrupts = signal(SignalKind::interrupt())?;
    let (done_tx, mut done_rx) = oneshot::channel::<()>();

    let absorber = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interrupts.recv() => {
                    debug!("absorbed interrupt while transport is active");
                }
                _ = &mut done_rx => break,
            }
        }
    });

    let wait_result = child.wait().await;

    // Dropping the sender wakes the absorber; join it so no signal task
    // outlives this call.
    drop(done_tx);
    if let Err(err) = absorber.await {
        warn!("signal absorber task failed: {}", err);
    }

    let status = wait_result?;
    if !status.success() {
        return Err(GateError::TransportFailed(format!(
            "{} exited with {}",
            executable, status
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_successful_process() {
        run("true", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_failing_process_is_transport_failed() {
        let result = run("false", &[]).await;
        assert!(matches!(result, Err(GateError::TransportFailed(_))));
    }

    #[tokio::test]
    async fn test_run_missing_executable_is_io_error() {
        let result = run("/nonexistent/transport-binary", &[]).await;
        assert!(matches!(result, Err(GateError::IoError(_))));
    }

    #[tokio::test]
    async fn test_run_passes_arguments_through() {
        // sh -c 'exit 3' exercises argument passthrough and the non-zero path.
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let result = run("sh", &args).await;
        assert!(matches!(result, Err(GateError::TransportFailed(_))));
    }
}
