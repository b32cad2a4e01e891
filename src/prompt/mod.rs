//! Interactive selection of regions and targets
//!
//! The terminal prompt sits behind the [`Prompt`] trait so the selection
//! logic can run under tests with scripted answers.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use dialoguer::Select;
use tracing::warn;

use crate::aws::ControlPlane;
use crate::error::{GateError, GateResult};

/// Fallback when the control plane cannot enumerate regions.
pub const DEFAULT_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ca-central-1",
    "eu-central-1",
    "eu-north-1",
    "eu-south-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "me-south-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

/// Single-select list prompt; `Ok(None)` means the user aborted.
pub trait Prompt {
    fn select(&self, message: &str, options: &[String]) -> GateResult<Option<usize>>;
}

/// Terminal prompt backed by dialoguer.
pub struct DialoguerPrompt;

impl Prompt for DialoguerPrompt {
    fn select(&self, message: &str, options: &[String]) -> GateResult<Option<usize>> {
        let choice = Select::new()
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact_opt()
            .map_err(|e| GateError::IoError(std::io::Error::other(e.to_string())))?;

        Ok(choice)
    }
}

/// Scripted prompt for tests: returns pre-seeded answers in order and
/// counts how often it was invoked.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<Vec<Option<usize>>>,
    pub calls: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(answers: Vec<Option<usize>>) -> Self {
        Self {
            answers: Mutex::new(answers),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn select(&self, _message: &str, _options: &[String]) -> GateResult<Option<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Ok(None);
        }
        Ok(answers.remove(0))
    }
}

/// Let the user pick a region.
///
/// Falls back to the built-in list when the control plane refuses the
/// enumeration; the presented list is sorted and deduplicated.
pub async fn select_region(
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
) -> GateResult<String> {
    let mut regions = match control_plane.describe_regions().await {
        Ok(regions) => regions,
        Err(err) => {
            warn!("region enumeration failed, using built-in list: {}", err);
            DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect()
        }
    };

    regions.sort();
    regions.dedup();

    match prompt.select("Choose a region in AWS:", &regions)? {
        Some(index) => Ok(regions[index].clone()),
        None => Err(GateError::NoSelectionMade),
    }
}

/// Let the user pick a running instance in `region`.
///
/// Returns `Ok(None)` without prompting when no instances are running;
/// the caller surfaces that as `NoRunningInstances`. Labels are
/// `"<Name-tag-or-empty>\t(<instance-id>)"`, keyed by the label itself, so
/// two instances producing an identical label collide and the last one
/// wins.
pub async fn select_target(
    control_plane: &dyn ControlPlane,
    prompt: &dyn Prompt,
    region: &str,
) -> GateResult<Option<String>> {
    let instances = control_plane.running_instances(region).await?;

    let mut table = BTreeMap::new();
    for inst in instances {
        let name = inst.name_tag.clone().unwrap_or_default();
        let label = format!("{}\t({})", name, inst.instance_id);
        table.insert(label, inst.instance_id);
    }

    if table.is_empty() {
        return Ok(None);
    }

    let options: Vec<String> = table.keys().cloned().collect();
    match prompt.select("Choose a target in AWS:", &options)? {
        Some(index) => Ok(Some(table[&options[index]].clone())),
        None => Err(GateError::NoSelectionMade),
    }
}
