//! Target resolution
//!
//! Turns ambiguous input (an address embedded in an ssh/scp invocation, or
//! nothing at all) into a definite region + instance id. DNS and address
//! matching are best-effort: any miss falls through to interactive
//! selection, only control-plane failures propagate.

use std::net::{Ipv4Addr, SocketAddr};

use tracing::debug;

use crate::aws::{self, ControlPlane};
use crate::command::ConnectionSpec;
use crate::error::{GateError, GateResult};
use crate::prompt::{self, Prompt};

/// A fully resolved session target; both fields are non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub region: String,
    pub instance_id: String,
}

/// Explicit resolution state threaded through a single invocation.
///
/// CLI flags and config pre-seed it to skip interactive prompts; once a
/// field is populated, later resolution calls reuse it without re-querying
/// or re-prompting.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub target: Option<String>,
}

impl ResolutionContext {
    pub fn new(profile: Option<String>, region: Option<String>, target: Option<String>) -> Self {
        // Empty strings from config files count as unset.
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            profile: non_empty(profile),
            region: non_empty(region),
            target: non_empty(target),
        }
    }

    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }

    /// The resolved target, if both region and instance id are populated.
    pub fn resolved(&self) -> Option<ResolvedTarget> {
        match (self.region.as_deref(), self.target.as_deref()) {
            (Some(region), Some(target)) if !region.is_empty() && !target.is_empty() => {
                Some(ResolvedTarget {
                    region: region.to_string(),
                    instance_id: target.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Region precondition: reuse the context value or prompt for one.
pub async fn ensure_region(
    ctx: &mut ResolutionContext,
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
) -> GateResult<String> {
    if let Some(region) = ctx.region.as_deref().filter(|r| !r.is_empty()) {
        return Ok(region.to_string());
    }

    let region = prompt::select_region(control_plane, prompt).await?;
    if region.is_empty() {
        return Err(GateError::MissingRegion);
    }

    ctx.region = Some(region.clone());
    Ok(region)
}

/// Target precondition: reuse the context value or select interactively.
pub async fn ensure_target(
    ctx: &mut ResolutionContext,
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
) -> GateResult<String> {
    if let Some(target) = ctx.target.as_deref().filter(|t| !t.is_empty()) {
        return Ok(target.to_string());
    }

    let region = required_region(ctx)?;

    match prompt::select_target(control_plane, prompt, &region).await? {
        Some(target) if !target.is_empty() => {
            ctx.target = Some(target.clone());
            Ok(target)
        }
        // Selection completed but yielded no usable id.
        Some(_) => Err(GateError::MissingTarget),
        None => Err(GateError::NoRunningInstances(region)),
    }
}

/// Resolve the target for a copy-style (scp) invocation.
pub async fn resolve_copy(
    ctx: &mut ResolutionContext,
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
    raw_command: &str,
) -> GateResult<ResolvedTarget> {
    if let Some(resolved) = ctx.resolved() {
        return Ok(resolved);
    }

    let region = required_region(ctx)?;
    let spec = ConnectionSpec::parse_copy(raw_command)?;
    resolve_spec(ctx, control_plane, prompt, region, &spec).await
}

/// Resolve the target for a shell-style (ssh) invocation.
pub async fn resolve_shell(
    ctx: &mut ResolutionContext,
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
    raw_command: &str,
) -> GateResult<ResolvedTarget> {
    if let Some(resolved) = ctx.resolved() {
        return Ok(resolved);
    }

    let region = required_region(ctx)?;
    let spec = ConnectionSpec::parse_shell(raw_command)?;
    resolve_spec(ctx, control_plane, prompt, region, &spec).await
}

/// Shared resolution protocol for both transport modes.
///
/// Each host candidate (destination first) is forward-resolved to an IPv4
/// address and matched against the running-instance inventory; the first
/// hit becomes the target. Everything short of a control-plane failure
/// falls through to interactive selection.
async fn resolve_spec(
    ctx: &mut ResolutionContext,
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
    region: String,
    spec: &ConnectionSpec,
) -> GateResult<ResolvedTarget> {
    for host in spec.lookup_candidates() {
        let Some(ip) = lookup_ipv4(host).await else {
            debug!("no IPv4 address for {}, trying next candidate", host);
            continue;
        };

        if let Some(instance_id) = aws::find_instance_by_ip(control_plane, &region, &ip).await? {
            debug!("resolved {} ({}) to {}", host, ip, instance_id);
            ctx.target = Some(instance_id.clone());
            return Ok(ResolvedTarget {
                region,
                instance_id,
            });
        }
    }

    let instance_id = ensure_target(ctx, control_plane, prompt).await?;
    Ok(ResolvedTarget {
        region,
        instance_id,
    })
}

fn required_region(ctx: &ResolutionContext) -> GateResult<String> {
    ctx.region
        .clone()
        .filter(|r| !r.is_empty())
        .ok_or(GateError::MissingRegion)
}

/// Best-effort forward lookup returning the first IPv4 address.
///
/// Literal IPv4 addresses short-circuit without touching the resolver.
async fn lookup_ipv4(host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Some(ip.to_string());
    }

    let addrs = tokio::net::lookup_host((host, 0)).await.ok()?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4.ip().to_string()),
            SocketAddr::V6(_) => None,
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::Instance;
    use crate::aws::mock::MockControlPlane;
    use crate::prompt::ScriptedPrompt;
    use std::sync::atomic::Ordering;

    fn with_ip(id: &str, private: &str) -> Instance {
        Instance {
            instance_id: id.to_string(),
            name_tag: None,
            public_ip: None,
            private_ip: Some(private.to_string()),
        }
    }

    #[tokio::test]
    async fn test_resolve_copy_by_destination_ip() {
        let cp = MockControlPlane::new()
            .with_instances("us-east-1", vec![with_ip("i-0abc123", "10.0.0.5")]);
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx =
            ResolutionContext::new(None, Some("us-east-1".to_string()), None);

        let resolved =
            resolve_copy(&mut ctx, &cp, &prompt, "./file.txt ubuntu@10.0.0.5:/tmp")
                .await
                .unwrap();

        assert_eq!(resolved.instance_id, "i-0abc123");
        assert_eq!(resolved.region, "us-east-1");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.target.as_deref(), Some("i-0abc123"));
    }

    #[tokio::test]
    async fn test_resolve_copy_requires_region() {
        let cp = MockControlPlane::new();
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx = ResolutionContext::default();

        let result = resolve_copy(&mut ctx, &cp, &prompt, "./a.txt user@10.0.0.1:/tmp").await;
        assert!(matches!(result, Err(GateError::MissingRegion)));
    }

    #[tokio::test]
    async fn test_resolve_copy_invalid_command() {
        let cp = MockControlPlane::new();
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx =
            ResolutionContext::new(None, Some("us-east-1".to_string()), None);

        let result = resolve_copy(&mut ctx, &cp, &prompt, "only-one-token").await;
        assert!(matches!(result, Err(GateError::InvalidCommand(_))));
    }

    #[tokio::test]
    async fn test_resolve_shell_unknown_host_falls_back_to_selection() {
        let cp = MockControlPlane::new()
            .with_instances("us-east-1", vec![with_ip("i-fallback", "10.0.0.9")]);
        let prompt = ScriptedPrompt::new(vec![Some(0)]);
        let mut ctx =
            ResolutionContext::new(None, Some("us-east-1".to_string()), None);

        // Reserved .invalid TLD guarantees the forward lookup fails.
        let resolved = resolve_shell(&mut ctx, &cp, &prompt, "ssh nosuch.invalid")
            .await
            .unwrap();

        assert_eq!(resolved.instance_id, "i-fallback");
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolution_is_memoized() {
        let cp = MockControlPlane::new();
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx = ResolutionContext::new(
            None,
            Some("us-east-1".to_string()),
            Some("i-cached".to_string()),
        );

        let first = resolve_shell(&mut ctx, &cp, &prompt, "ssh whatever").await.unwrap();
        let second = resolve_copy(&mut ctx, &cp, &prompt, "./a.txt b@10.0.0.1:/x")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.instance_id, "i-cached");
        assert_eq!(cp.instance_calls.load(Ordering::SeqCst), 0);
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_target_no_running_instances() {
        let cp = MockControlPlane::new().with_instances("us-east-1", vec![]);
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx =
            ResolutionContext::new(None, Some("us-east-1".to_string()), None);

        let result = ensure_target(&mut ctx, &cp, &prompt).await;
        assert!(matches!(result, Err(GateError::NoRunningInstances(_))));
        assert_eq!(prompt.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_target_empty_selection_is_missing_target() {
        let cp = MockControlPlane::new()
            .with_instances("us-east-1", vec![with_ip("", "10.0.0.1")]);
        let prompt = ScriptedPrompt::new(vec![Some(0)]);
        let mut ctx =
            ResolutionContext::new(None, Some("us-east-1".to_string()), None);

        let result = ensure_target(&mut ctx, &cp, &prompt).await;
        assert!(matches!(result, Err(GateError::MissingTarget)));
        assert_eq!(ctx.target, None);
    }

    #[tokio::test]
    async fn test_ensure_region_memoized() {
        let cp = MockControlPlane::new();
        let prompt = ScriptedPrompt::new(vec![]);
        let mut ctx =
            ResolutionContext::new(None, Some("eu-west-1".to_string()), None);

        let region = ensure_region(&mut ctx, &cp, &prompt).await.unwrap();
        assert_eq!(region, "eu-west-1");
        assert_eq!(cp.region_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_ipv4_literal_short_circuits() {
        assert_eq!(lookup_ipv4("10.0.0.5").await.as_deref(), Some("10.0.0.5"));
        assert_eq!(lookup_ipv4("").await, None);
    }
}
