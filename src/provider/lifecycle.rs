//! Remote configuration resources kept in lockstep with local summaries.
//!
//! Both mutations run remote first, local second. There is no transaction
//! spanning the two sides; when the second step fails the caller gets an
//! [`Error::Inconsistency`] describing what exists where, and nothing is
//! rolled back automatically.
//!
//! Summaries are scoped to the provider that owns the lifecycle, so one
//! provider never reads or deletes another provider's configuration.

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_common::{Error, Preset, PresetSummary, Result};
use tracing::{debug, error, info};

use super::store::SummaryStore;

/// The remote half of a provider's preset configuration.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Create the remote resources for `preset` and describe them.
    ///
    /// On error nothing created by this call may remain remotely, unless the
    /// error is itself an [`Error::Inconsistency`].
    async fn create_config(&self, preset: &Preset) -> Result<PresetSummary>;

    /// Delete every remote resource `summary` references.
    async fn delete_config(&self, summary: &PresetSummary) -> Result<()>;
}

pub struct ConfigLifecycle<B> {
    provider: &'static str,
    backend: B,
    store: Arc<dyn SummaryStore>,
}

impl<B: ConfigBackend> ConfigLifecycle<B> {
    pub fn new(provider: &'static str, backend: B, store: Arc<dyn SummaryStore>) -> Self {
        Self {
            provider,
            backend,
            store,
        }
    }

    /// Create the remote configuration for `preset`, then record its summary.
    ///
    /// Fails with [`Error::Conflict`] if this provider already has a summary
    /// for the name.
    pub async fn create(&self, preset: &Preset) -> Result<PresetSummary> {
        preset.validate()?;

        match self.store.get(self.provider, &preset.name) {
            Ok(_) => {
                return Err(Error::Conflict(format!(
                    "preset {:?} already exists",
                    preset.name
                )))
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let mut summary = self.backend.create_config(preset).await?;
        summary.provider = self.provider.to_string();
        debug!(
            provider = self.provider,
            preset = %preset.name,
            video_config_id = %summary.video_config_id,
            "created remote configuration"
        );

        if let Err(e) = self.store.put(&summary) {
            error!(
                provider = self.provider,
                preset = %preset.name,
                video_config_id = %summary.video_config_id,
                audio_config_id = ?summary.audio_config_id,
                error = %e,
                "remote configuration created but summary not stored"
            );
            return Err(Error::inconsistency(
                format!("creating preset {:?}", preset.name),
                format!(
                    "{} configuration {} exists remotely but its summary could not be stored: {}",
                    self.provider,
                    config_ids(&summary),
                    e
                ),
            ));
        }

        info!(provider = self.provider, preset = %preset.name, "preset created");
        Ok(summary)
    }

    /// Look up this provider's stored summary for `name`.
    pub fn get(&self, name: &str) -> Result<PresetSummary> {
        self.store.get(self.provider, name)
    }

    /// Delete the remote configuration for `name`, then its summary.
    ///
    /// A failed remote delete leaves the summary in place so the call can be
    /// retried.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let summary = self.store.get(self.provider, name)?;

        self.backend.delete_config(&summary).await?;

        if let Err(e) = self.store.delete(self.provider, name) {
            error!(
                provider = self.provider,
                preset = %name,
                error = %e,
                "remote configuration deleted but summary not removed"
            );
            return Err(Error::inconsistency(
                format!("deleting preset {:?}", name),
                format!(
                    "{} configuration {} was deleted remotely but its summary remains: {}",
                    self.provider,
                    config_ids(&summary),
                    e
                ),
            ));
        }

        info!(provider = self.provider, preset = %name, "preset deleted");
        Ok(())
    }
}

fn config_ids(summary: &PresetSummary) -> String {
    match &summary.audio_config_id {
        Some(audio) => format!("{} (audio {})", summary.video_config_id, audio),
        None => summary.video_config_id.clone(),
    }
}
