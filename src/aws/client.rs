//! AWS SDK implementation of the control-plane boundary

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::types::Filter;
use tracing::debug;

use super::{ControlPlane, Instance, SessionTicket};
use crate::error::{GateError, GateResult};

/// Region used for the region enumeration call itself.
const REGION_QUERY_REGION: &str = "us-east-1";

/// Control plane backed by the AWS SDK (EC2 + SSM).
///
/// Credentials come from the ambient chain (env, shared config, instance
/// metadata); an explicit profile narrows it.
pub struct AwsControlPlane {
    profile: Option<String>,
}

impl AwsControlPlane {
    pub fn new(profile: Option<String>) -> Self {
        Self { profile }
    }

    async fn sdk_config(&self, region: &str) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));

        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }

        loader.load().await
    }
}

#[async_trait]
impl ControlPlane for AwsControlPlane {
    async fn describe_regions(&self) -> GateResult<Vec<String>> {
        let config = self.sdk_config(REGION_QUERY_REGION).await;
        let client = aws_sdk_ec2::Client::new(&config);

        let output = client
            .describe_regions()
            .send()
            .await
            .map_err(|e| GateError::LookupFailed(e.to_string()))?;

        Ok(output
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(str::to_string))
            .collect())
    }

    async fn running_instances(&self, region: &str) -> GateResult<Vec<Instance>> {
        let config = self.sdk_config(region).await;
        let client = aws_sdk_ec2::Client::new(&config);

        let output = client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values("running")
                    .build(),
            )
            .send()
            .await
            .map_err(|e| GateError::LookupFailed(e.to_string()))?;

        let mut instances = Vec::new();
        for reservation in output.reservations() {
            for inst in reservation.instances() {
                let Some(instance_id) = inst.instance_id() else {
                    continue;
                };

                let name_tag = inst
                    .tags()
                    .iter()
                    .find(|tag| tag.key() == Some("Name"))
                    .and_then(|tag| tag.value())
                    .map(str::to_string);

                instances.push(Instance {
                    instance_id: instance_id.to_string(),
                    name_tag,
                    public_ip: inst.public_ip_address().map(str::to_string),
                    private_ip: inst.private_ip_address().map(str::to_string),
                });
            }
        }

        debug!("found {} running instances in {}", instances.len(), region);
        Ok(instances)
    }

    async fn start_session(&self, region: &str, target: &str) -> GateResult<SessionTicket> {
        let config = self.sdk_config(region).await;
        let client = aws_sdk_ssm::Client::new(&config);

        let output = client
            .start_session()
            .target(target)
            .send()
            .await
            .map_err(|e| GateError::SessionOpenFailed(e.to_string()))?;

        let session_id = output
            .session_id()
            .ok_or_else(|| GateError::SessionOpenFailed("missing session id".to_string()))?;
        let stream_url = output
            .stream_url()
            .ok_or_else(|| GateError::SessionOpenFailed("missing stream url".to_string()))?;
        let token_value = output
            .token_value()
            .ok_or_else(|| GateError::SessionOpenFailed("missing token value".to_string()))?;

        Ok(SessionTicket {
            session_id: session_id.to_string(),
            stream_url: stream_url.to_string(),
            token_value: token_value.to_string(),
        })
    }

    async fn terminate_session(&self, region: &str, session_id: &str) -> GateResult<()> {
        let config = self.sdk_config(region).await;
        let client = aws_sdk_ssm::Client::new(&config);

        client
            .terminate_session()
            .session_id(session_id)
            .send()
            .await
            .map_err(|e| GateError::SessionCloseFailed(e.to_string()))?;

        Ok(())
    }
}
