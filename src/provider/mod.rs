//! Provider capability contract and the machinery shared by every backend.
//!
//! A backend (Bitmovin, Encoding.com, ...) implements [`TranscodingProvider`]
//! and is only ever reached through the [`registry::ProviderRegistry`]. The
//! submodules hold the provider-agnostic pieces backends are built from:
//!
//! - [`status`]: raw status vocabulary to canonical
//!   [`Status`](orchestrator_common::Status)
//! - [`pagination`]: draining offset/limit listings
//! - [`store`] and [`lifecycle`]: remote config resources kept in lockstep
//!   with local preset summaries
//! - [`enrichment`]: muxing records to canonical output files

pub mod enrichment;
pub mod lifecycle;
pub mod pagination;
pub mod registry;
pub mod status;
pub mod store;

use async_trait::async_trait;
use orchestrator_common::{JobStatus, Preset, PresetSummary, Result};
use serde::{Deserialize, Serialize};

/// Static description of what a provider accepts and produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Source containers the provider can read (e.g. `"mp4"`, `"mov"`).
    pub input_formats: Vec<String>,
    /// Output containers the provider can produce.
    pub output_formats: Vec<String>,
    /// Storage destinations outputs can be written to (e.g. `"s3"`).
    pub destinations: Vec<String>,
}

impl Capabilities {
    pub fn new(input: &[&str], output: &[&str], destinations: &[&str]) -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            input_formats: owned(input),
            output_formats: owned(output),
            destinations: owned(destinations),
        }
    }
}

/// Async trait every transcoding backend implements.
///
/// Methods may be called concurrently for distinct jobs and presets. Calls
/// racing on the same preset name or job ID are not serialized here.
#[async_trait]
pub trait TranscodingProvider: Send + Sync {
    /// Registry key for this provider (e.g. `"bitmovin"`).
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Submit `source` for transcoding into every preset in `presets`.
    ///
    /// A preset without a mapping for this provider fails the whole call
    /// with [`orchestrator_common::Error::PresetNotFound`] before anything is
    /// created remotely.
    async fn transcode(&self, source: &str, presets: &[Preset]) -> Result<JobStatus>;

    /// Recompute the status of a provider-owned job.
    async fn job_status(&self, provider_job_id: &str) -> Result<JobStatus>;

    async fn cancel_job(&self, provider_job_id: &str) -> Result<()>;

    /// Returns `Ok(())` when the provider is reachable and healthy.
    async fn healthcheck(&self) -> Result<()>;

    /// Create the remote configuration for `preset`, returning its preset ID.
    async fn create_preset(&self, preset: &Preset) -> Result<String>;

    async fn get_preset(&self, name: &str) -> Result<PresetSummary>;

    async fn delete_preset(&self, name: &str) -> Result<()>;
}

/// Reject presets that cannot be used with `provider` before any remote call.
///
/// Returns the provider-specific mapping value of each preset, in order.
pub fn require_mappings<'a>(provider: &str, presets: &'a [Preset]) -> Result<Vec<&'a str>> {
    presets
        .iter()
        .map(|preset| {
            preset
                .mapping_for(provider)
                .ok_or_else(|| orchestrator_common::Error::preset_not_found(&preset.name, provider))
        })
        .collect()
}

/// Final path segment of a source URL without its extension.
///
/// `http://host/dir/video.mp4?sig=1` becomes `video`. Falls back to
/// `"video"` when the URL has no usable file name.
pub fn source_stem(source: &str) -> &str {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(idx) => &file[..idx],
    };
    if stem.is_empty() {
        "video"
    } else {
        stem
    }
}
