//! Job facade: the operations the HTTP layer and CLI call.
//!
//! Resolves the owning provider per request through the registry, keeps the
//! local job index that maps a [`JobId`] back to `(provider, provider job ID)`,
//! and bounds every provider call by the configured deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orchestrator_common::{Error, JobId, JobStatus, Preset, PresetSummary, Result};
use orchestrator_db::models::JobRecord;
use orchestrator_db::pool::{get_conn, DbPool};
use orchestrator_db::queries::jobs;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::provider::registry::ProviderRegistry;
use crate::provider::{Capabilities, TranscodingProvider};

/// Health of a provider as reported by its healthcheck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body of `GET /providers/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescription {
    pub name: String,
    pub capabilities: Capabilities,
    pub health: ProviderHealth,
    /// `false` when the provider's configuration is missing or invalid.
    pub enabled: bool,
}

pub struct JobService {
    registry: Arc<ProviderRegistry>,
    pool: DbPool,
    deadline: Duration,
}

impl JobService {
    pub fn new(registry: Arc<ProviderRegistry>, pool: DbPool, deadline: Duration) -> Self {
        Self {
            registry,
            pool,
            deadline,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run `fut` under the request deadline.
    async fn within<T, F>(&self, what: impl FnOnce() -> String, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!("after {:?} {}", self.deadline, what()))),
        }
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn TranscodingProvider>> {
        self.registry.get(name)
    }

    /// Submit `source` to `provider_name` and index the resulting job.
    pub async fn transcode(
        &self,
        provider_name: &str,
        source: &str,
        presets: &[Preset],
    ) -> Result<JobStatus> {
        if source.trim().is_empty() {
            return Err(Error::Validation("source is required".into()));
        }
        if presets.is_empty() {
            return Err(Error::Validation("at least one preset is required".into()));
        }

        let provider = self.provider(provider_name)?;
        let mut status = self
            .within(
                || format!("transcoding on {provider_name}"),
                provider.transcode(source, presets),
            )
            .await?;

        let record = get_conn(&self.pool).and_then(|conn| {
            jobs::create_job(&conn, provider_name, &status.provider_job_id, source)
        });
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                error!(
                    provider = provider_name,
                    provider_job_id = %status.provider_job_id,
                    error = %e,
                    "provider job created but not indexed"
                );
                return Err(Error::inconsistency(
                    "submitting job",
                    format!(
                        "{provider_name} job {} exists remotely but could not be indexed: {e}",
                        status.provider_job_id
                    ),
                ));
            }
        };

        info!(
            job_id = %record.id,
            provider = provider_name,
            provider_job_id = %status.provider_job_id,
            presets = presets.len(),
            "job submitted"
        );
        status.job_id = Some(record.id);
        Ok(status)
    }

    fn job_record(&self, id: JobId) -> Result<JobRecord> {
        let conn = get_conn(&self.pool)?;
        jobs::get_job(&conn, id)
    }

    /// Recompute the status of an indexed job from its provider.
    pub async fn job_status(&self, id: JobId) -> Result<JobStatus> {
        let record = self.job_record(id)?;
        let provider = self.provider(&record.provider_name)?;

        let mut status = self
            .within(
                || format!("retrieving status of job {id}"),
                provider.job_status(&record.provider_job_id),
            )
            .await?;
        status.job_id = Some(id);
        Ok(status)
    }

    /// Cancel an indexed job and return its status afterwards.
    pub async fn cancel_job(&self, id: JobId) -> Result<JobStatus> {
        let record = self.job_record(id)?;
        let provider = self.provider(&record.provider_name)?;

        self.within(
            || format!("canceling job {id}"),
            provider.cancel_job(&record.provider_job_id),
        )
        .await?;
        info!(job_id = %id, provider = %record.provider_name, "job canceled");

        self.job_status(id).await
    }

    pub async fn create_preset(&self, provider_name: &str, preset: &Preset) -> Result<String> {
        let provider = self.provider(provider_name)?;
        self.within(
            || format!("creating preset {:?} on {provider_name}", preset.name),
            provider.create_preset(preset),
        )
        .await
    }

    pub async fn get_preset(&self, provider_name: &str, name: &str) -> Result<PresetSummary> {
        let provider = self.provider(provider_name)?;
        self.within(
            || format!("retrieving preset {name:?} on {provider_name}"),
            provider.get_preset(name),
        )
        .await
    }

    pub async fn delete_preset(&self, provider_name: &str, name: &str) -> Result<()> {
        let provider = self.provider(provider_name)?;
        self.within(
            || format!("deleting preset {name:?} on {provider_name}"),
            provider.delete_preset(name),
        )
        .await
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Describe a registered provider, running its healthcheck.
    ///
    /// A provider whose configuration is rejected is reported as disabled
    /// instead of failing the call.
    pub async fn describe_provider(&self, name: &str) -> Result<ProviderDescription> {
        if !self.registry.is_registered(name) {
            return Err(Error::not_found("provider", name));
        }

        let provider = match self.registry.get(name) {
            Ok(provider) => provider,
            Err(e @ Error::Configuration { .. }) => {
                return Ok(ProviderDescription {
                    name: name.to_string(),
                    capabilities: Capabilities::default(),
                    health: ProviderHealth {
                        ok: false,
                        message: Some(e.to_string()),
                    },
                    enabled: false,
                })
            }
            Err(e) => return Err(e),
        };

        let health = match self
            .within(|| format!("checking health of {name}"), provider.healthcheck())
            .await
        {
            Ok(()) => ProviderHealth {
                ok: true,
                message: None,
            },
            Err(e) => {
                warn!(provider = name, error = %e, "healthcheck failed");
                ProviderHealth {
                    ok: false,
                    message: Some(e.to_string()),
                }
            }
        };

        Ok(ProviderDescription {
            name: name.to_string(),
            capabilities: provider.capabilities(),
            health,
            enabled: true,
        })
    }
}
