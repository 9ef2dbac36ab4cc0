//! Bitmovin provider.
//!
//! Presets map to stored codec configurations: `providerMapping["bitmovin"]`
//! names a preset summary created through [`TranscodingProvider::create_preset`].
//! A transcode builds one encoding with one HTTP(S) input, one video stream
//! (plus audio when configured) and one muxing per preset, then starts it.
//! Outputs of finished encodings are discovered through the enrichment
//! pipeline.

pub mod api;
pub mod assembler;
pub mod client;
pub mod configuration;
#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_common::{Error, JobStatus, Preset, PresetSummary, Result, Status};
use reqwest::Url;
use tracing::{error, info};

use self::api::{BitmovinApi, HttpInput, InputStream, NewEncoding, NewStream};
use self::assembler::{assemble, AssemblerConfig};
use self::client::HttpBitmovinApi;
use self::configuration::CodecConfigs;
use crate::config::BitmovinConfig;
use crate::provider::enrichment::{enrich_outputs, MuxingKind};
use crate::provider::lifecycle::ConfigLifecycle;
use crate::provider::registry::ProviderContext;
use crate::provider::status::StatusTable;
use crate::provider::store::SummaryStore;
use crate::provider::{require_mappings, source_stem, Capabilities, TranscodingProvider};

pub const NAME: &str = "bitmovin";

/// Muxing kinds a Bitmovin job may produce, in enrichment order.
const OUTPUT_KINDS: [MuxingKind; 2] = [MuxingKind::Mp4, MuxingKind::ProgressiveWebm];

pub const STATUS_TABLE: StatusTable = StatusTable::new(&[
    ("created", Status::Queued),
    ("queued", Status::Queued),
    ("running", Status::Started),
    ("transferring", Status::Started),
    ("finished", Status::Finished),
    ("error", Status::Failed),
    ("canceled", Status::Failed),
]);

/// Factory registered under [`NAME`].
pub fn factory(ctx: &ProviderContext) -> Result<Arc<dyn TranscodingProvider>> {
    let settings = validate(ctx.config.bitmovin.as_ref())?;
    let api = Arc::new(HttpBitmovinApi::new(settings)?);
    Ok(Arc::new(BitmovinProvider::new(
        api,
        ctx.store.clone(),
        settings.clone(),
    )))
}

fn validate(settings: Option<&BitmovinConfig>) -> Result<&BitmovinConfig> {
    let settings =
        settings.ok_or_else(|| Error::configuration(NAME, "missing [bitmovin] section"))?;
    for (field, value) in [
        ("api_key", &settings.api_key),
        ("output_id", &settings.output_id),
        ("destination", &settings.destination),
        ("endpoint", &settings.endpoint),
    ] {
        if value.trim().is_empty() {
            return Err(Error::configuration(NAME, format!("{field} is required")));
        }
    }
    Ok(settings)
}

pub struct BitmovinProvider {
    api: Arc<dyn BitmovinApi>,
    configs: ConfigLifecycle<CodecConfigs>,
    settings: BitmovinConfig,
}

impl BitmovinProvider {
    pub fn new(
        api: Arc<dyn BitmovinApi>,
        store: Arc<dyn SummaryStore>,
        settings: BitmovinConfig,
    ) -> Self {
        Self {
            configs: ConfigLifecycle::new(NAME, CodecConfigs::new(api.clone()), store),
            api,
            settings,
        }
    }

    fn destination_root(&self, encoding_id: &str) -> String {
        format!(
            "{}/{}/",
            self.settings.destination.trim_end_matches('/'),
            encoding_id
        )
    }

    /// Resolve each preset to its stored summary and muxing kind.
    fn resolve<'a>(
        &self,
        presets: &'a [Preset],
    ) -> Result<Vec<(&'a Preset, PresetSummary, MuxingKind)>> {
        let mappings = require_mappings(NAME, presets)?;
        presets
            .iter()
            .zip(mappings)
            .map(|(preset, summary_name)| {
                let summary = self.configs.get(summary_name).map_err(|e| {
                    if e.is_not_found() {
                        Error::preset_not_found(&preset.name, NAME)
                    } else {
                        e
                    }
                })?;
                let kind = MuxingKind::for_container(&summary.container).ok_or_else(|| {
                    Error::Validation(format!(
                        "preset {:?} has unsupported container {:?}",
                        preset.name, summary.container
                    ))
                })?;
                Ok((preset, summary, kind))
            })
            .collect()
    }

    /// Attach the input, streams and muxings to a created encoding and start
    /// it.
    async fn populate_and_start(
        &self,
        encoding_id: &str,
        url: &Url,
        secure: bool,
        host: String,
        stem: &str,
        outputs: &[(&Preset, PresetSummary, MuxingKind)],
    ) -> Result<()> {
        let input_id = self
            .api
            .create_input(&HttpInput {
                secure,
                name: host.clone(),
                host,
            })
            .await?;
        let input_streams = vec![InputStream {
            input_id,
            input_path: url.path().to_string(),
            selection_mode: "AUTO".to_string(),
        }];

        for (preset, summary, kind) in outputs {
            let video_stream_id = self
                .api
                .create_stream(
                    encoding_id,
                    &NewStream {
                        codec_config_id: summary.video_config_id.clone(),
                        input_streams: input_streams.clone(),
                    },
                )
                .await?;
            let audio_stream_id = match &summary.audio_config_id {
                Some(audio_config_id) => Some(
                    self.api
                        .create_stream(
                            encoding_id,
                            &NewStream {
                                codec_config_id: audio_config_id.clone(),
                                input_streams: input_streams.clone(),
                            },
                        )
                        .await?,
                ),
                None => None,
            };

            let assembly = AssemblerConfig {
                encoding_id: encoding_id.to_string(),
                output_id: self.settings.output_id.clone(),
                destination_path: format!("{encoding_id}/"),
                filename: format!("{}/{}.{}", preset.name, stem, preset.extension()),
                video_stream_id,
                audio_stream_id,
            };
            self.api
                .create_muxing(&assembly.encoding_id, *kind, &assemble(*kind, &assembly))
                .await?;
        }

        self.api.start_encoding(encoding_id).await
    }
}

#[async_trait]
impl TranscodingProvider for BitmovinProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            &["mp4", "mov", "mkv", "webm", "ts"],
            &["mp4", "webm"],
            &["s3", "gcs", "azure"],
        )
    }

    async fn transcode(&self, source: &str, presets: &[Preset]) -> Result<JobStatus> {
        let outputs = self.resolve(presets)?;

        let url = Url::parse(source)
            .map_err(|e| Error::Validation(format!("invalid source URL {source:?}: {e}")))?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(Error::Validation(format!(
                    "bitmovin cannot read {other:?} sources"
                )))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| Error::Validation(format!("source URL {source:?} has no host")))?
            .to_string();
        let stem = source_stem(source);

        let encoding_id = self
            .api
            .create_encoding(&NewEncoding {
                name: stem.to_string(),
                cloud_region: self.settings.cloud_region.clone(),
            })
            .await?;

        if let Err(e) = self
            .populate_and_start(&encoding_id, &url, secure, host, stem, &outputs)
            .await
        {
            error!(encoding_id = %encoding_id, error = %e, "encoding created but not started");
            return Err(Error::inconsistency(
                "submitting the encoding",
                format!("bitmovin encoding {encoding_id} was created but not started: {e}"),
            ));
        }
        info!(encoding_id = %encoding_id, presets = outputs.len(), "bitmovin encoding started");

        Ok(JobStatus::new(NAME, &encoding_id, Status::Queued)
            .with_destination(self.destination_root(&encoding_id)))
    }

    async fn job_status(&self, provider_job_id: &str) -> Result<JobStatus> {
        let remote = self.api.encoding_status(provider_job_id).await?;
        let status = STATUS_TABLE.translate(&remote.status);

        let mut job = JobStatus::new(NAME, provider_job_id, status)
            .with_destination(self.destination_root(provider_job_id));
        job.status_message = remote.error_message.unwrap_or_default();
        job.provider_status = remote.raw;

        if status != Status::Finished {
            return Ok(job);
        }
        enrich_outputs(&*self.api, &OUTPUT_KINDS, self.settings.page_size, job).await
    }

    async fn cancel_job(&self, provider_job_id: &str) -> Result<()> {
        self.api.stop_encoding(provider_job_id).await
    }

    async fn healthcheck(&self) -> Result<()> {
        self.api.account_information().await
    }

    async fn create_preset(&self, preset: &Preset) -> Result<String> {
        self.configs.create(preset).await.map(|summary| summary.name)
    }

    async fn get_preset(&self, name: &str) -> Result<PresetSummary> {
        self.configs.get(name)
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        self.configs.delete(name).await
    }
}
