//! Control-plane boundary
//!
//! The resolver, selector, and broker all talk to AWS through the
//! [`ControlPlane`] trait so they can be exercised against the in-memory
//! mock without credentials or network access.

pub mod client;
pub mod mock;

use async_trait::async_trait;

use crate::error::GateResult;

/// A running EC2 instance as reported by the control plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub instance_id: String,
    pub name_tag: Option<String>,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
}

/// Opaque session credentials issued by a successful session-start call.
///
/// The broker never inspects these values, only passes them through to the
/// transport process.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTicket {
    pub session_id: String,
    pub stream_url: String,
    pub token_value: String,
}

/// Region-scoped control-plane operations consumed by the core.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Enumerate all available regions.
    async fn describe_regions(&self) -> GateResult<Vec<String>>;

    /// List instances in the running state within `region`.
    async fn running_instances(&self, region: &str) -> GateResult<Vec<Instance>>;

    /// Negotiate a new session against `target`.
    async fn start_session(&self, region: &str, target: &str) -> GateResult<SessionTicket>;

    /// Terminate a previously opened session.
    async fn terminate_session(&self, region: &str, session_id: &str) -> GateResult<()>;

    /// Service endpoint handed to the transport process.
    fn session_endpoint(&self, region: &str) -> String {
        format!("https://ssm.{}.amazonaws.com", region)
    }
}

/// Resolve a network address to an instance id.
///
/// Returns the first running instance in `region` whose public or private
/// address equals `ip`; an absent match is `Ok(None)`, not an error. The
/// query is read-only and idempotent, so repeat callers simply re-query.
pub async fn find_instance_by_ip(
    control_plane: &dyn ControlPlane,
    region: &str,
    ip: &str,
) -> GateResult<Option<String>> {
    let instances = control_plane.running_instances(region).await?;

    Ok(instances
        .into_iter()
        .find(|inst| {
            inst.public_ip.as_deref() == Some(ip) || inst.private_ip.as_deref() == Some(ip)
        })
        .map(|inst| inst.instance_id))
}

#[cfg(test)]
mod tests {
    use super::mock::MockControlPlane;
    use super::*;

    fn instance(id: &str, public: Option<&str>, private: Option<&str>) -> Instance {
        Instance {
            instance_id: id.to_string(),
            name_tag: None,
            public_ip: public.map(str::to_string),
            private_ip: private.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_find_instance_by_public_ip() {
        let cp = MockControlPlane::new().with_instances(
            "us-east-1",
            vec![
                instance("i-aaa", Some("54.1.2.3"), Some("10.0.0.4")),
                instance("i-bbb", Some("54.4.5.6"), Some("10.0.0.5")),
            ],
        );

        let found = find_instance_by_ip(&cp, "us-east-1", "54.4.5.6").await.unwrap();
        assert_eq!(found.as_deref(), Some("i-bbb"));
    }

    #[tokio::test]
    async fn test_find_instance_by_private_ip() {
        let cp = MockControlPlane::new().with_instances(
            "us-east-1",
            vec![instance("i-aaa", None, Some("10.0.0.4"))],
        );

        let found = find_instance_by_ip(&cp, "us-east-1", "10.0.0.4").await.unwrap();
        assert_eq!(found.as_deref(), Some("i-aaa"));
    }

    #[tokio::test]
    async fn test_find_instance_absent_is_not_an_error() {
        let cp = MockControlPlane::new().with_instances("us-east-1", vec![]);

        let found = find_instance_by_ip(&cp, "us-east-1", "10.9.9.9").await.unwrap();
        assert_eq!(found, None);
    }
}
