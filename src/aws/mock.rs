//! In-memory control plane for tests
//!
//! Records call counts so tests can assert that memoized resolution skips
//! repeat queries and that sessions are closed exactly once.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ControlPlane, Instance, SessionTicket};
use crate::error::{GateError, GateResult};

/// Mock control plane with canned regions/instances and call counters.
#[derive(Default)]
pub struct MockControlPlane {
    regions: Vec<String>,
    instances: HashMap<String, Vec<Instance>>,
    fail_regions: bool,
    fail_start: bool,
    next_session: Mutex<u64>,
    open_sessions: Mutex<Vec<String>>,
    pub region_calls: AtomicUsize,
    pub instance_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub terminate_calls: AtomicUsize,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn with_instances(mut self, region: &str, instances: Vec<Instance>) -> Self {
        self.instances.insert(region.to_string(), instances);
        self
    }

    /// Make region enumeration fail, forcing the built-in default list.
    pub fn with_failing_regions(mut self) -> Self {
        self.fail_regions = true;
        self
    }

    /// Make session-start fail, simulating remote rejection.
    pub fn with_failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Session ids opened and not yet terminated.
    pub fn open_session_ids(&self) -> Vec<String> {
        self.open_sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn describe_regions(&self) -> GateResult<Vec<String>> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_regions {
            return Err(GateError::LookupFailed("region enumeration refused".to_string()));
        }
        Ok(self.regions.clone())
    }

    async fn running_instances(&self, region: &str) -> GateResult<Vec<Instance>> {
        self.instance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.instances.get(region).cloned().unwrap_or_default())
    }

    async fn start_session(&self, _region: &str, target: &str) -> GateResult<SessionTicket> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(GateError::SessionOpenFailed("session refused".to_string()));
        }

        let mut next = self.next_session.lock().unwrap();
        *next += 1;
        let session_id = format!("mock-session-{}", *next);
        self.open_sessions.lock().unwrap().push(session_id.clone());

        Ok(SessionTicket {
            session_id,
            stream_url: format!("wss://mock/{}", target),
            token_value: "mock-token".to_string(),
        })
    }

    async fn terminate_session(&self, _region: &str, session_id: &str) -> GateResult<()> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);

        let mut open = self.open_sessions.lock().unwrap();
        match open.iter().position(|id| id == session_id) {
            Some(index) => {
                open.remove(index);
                Ok(())
            }
            None => Err(GateError::SessionCloseFailed(format!(
                "unknown session {}",
                session_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_session_lifecycle() {
        let cp = MockControlPlane::new();

        let ticket = cp.start_session("us-east-1", "i-123").await.unwrap();
        assert_eq!(cp.open_session_ids(), vec![ticket.session_id.clone()]);

        cp.terminate_session("us-east-1", &ticket.session_id).await.unwrap();
        assert!(cp.open_session_ids().is_empty());
        assert_eq!(cp.start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cp.terminate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mock_terminate_unknown_session_is_an_error() {
        let cp = MockControlPlane::new();

        let result = cp.terminate_session("us-east-1", "mock-session-404").await;
        assert!(matches!(result, Err(GateError::SessionCloseFailed(_))));
    }

    #[tokio::test]
    async fn test_mock_failing_regions() {
        let cp = MockControlPlane::new().with_failing_regions();
        assert!(matches!(
            cp.describe_regions().await,
            Err(GateError::LookupFailed(_))
        ));
    }
}
