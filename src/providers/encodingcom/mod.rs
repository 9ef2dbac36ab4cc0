//! Encoding.com provider.
//!
//! `providerMapping["encodingcom"]` is used verbatim as the output of one
//! `AddMedia` format per preset. Presets created through this provider are
//! saved remotely with `SavePreset` and can be referenced by name.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod presets;

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_common::{Error, JobStatus, OutputFile, Preset, PresetSummary, Result, Status};
use serde_json::{Map, Value};
use tracing::info;

use self::client::{EncodingComApi, HttpEncodingComApi, MediaFormat, MediaStatus};
use self::presets::SavedPresets;
use crate::config::EncodingComConfig;
use crate::provider::lifecycle::ConfigLifecycle;
use crate::provider::registry::ProviderContext;
use crate::provider::status::StatusTable;
use crate::provider::store::SummaryStore;
use crate::provider::{require_mappings, source_stem, Capabilities, TranscodingProvider};

pub const NAME: &str = "encodingcom";

pub const STATUS_TABLE: StatusTable = StatusTable::new(&[
    ("new", Status::Queued),
    ("downloading", Status::Started),
    ("ready to process", Status::Started),
    ("waiting for encoder", Status::Started),
    ("processing", Status::Started),
    ("saving", Status::Started),
    ("finished", Status::Finished),
    ("error", Status::Failed),
]);

/// Factory registered under [`NAME`].
pub fn factory(ctx: &ProviderContext) -> Result<Arc<dyn TranscodingProvider>> {
    let settings = validate(ctx.config.encodingcom.as_ref())?;
    let api = Arc::new(HttpEncodingComApi::new(settings)?);
    Ok(Arc::new(EncodingComProvider::new(
        api,
        ctx.store.clone(),
        settings.clone(),
    )))
}

/// Credentials are required up front. The destination is only needed to
/// submit media, so status, presets and healthchecks work without one.
fn validate(settings: Option<&EncodingComConfig>) -> Result<&EncodingComConfig> {
    let settings =
        settings.ok_or_else(|| Error::configuration(NAME, "missing [encodingcom] section"))?;
    for (field, value) in [
        ("user_id", &settings.user_id),
        ("user_key", &settings.user_key),
        ("endpoint", &settings.endpoint),
    ] {
        if value.trim().is_empty() {
            return Err(Error::configuration(NAME, format!("{field} is required")));
        }
    }
    Ok(settings)
}

/// Extension Encoding.com writes for a preset extension.
fn output_extension(extension: &str) -> &str {
    if extension.eq_ignore_ascii_case("ts") {
        "m3u8"
    } else {
        extension
    }
}

pub struct EncodingComProvider {
    api: Arc<dyn EncodingComApi>,
    presets: ConfigLifecycle<SavedPresets>,
    settings: EncodingComConfig,
}

impl EncodingComProvider {
    pub fn new(
        api: Arc<dyn EncodingComApi>,
        store: Arc<dyn SummaryStore>,
        settings: EncodingComConfig,
    ) -> Self {
        Self {
            presets: ConfigLifecycle::new(NAME, SavedPresets::new(api.clone()), store),
            api,
            settings,
        }
    }

    fn destination_root(&self) -> String {
        let destination = self.settings.destination.trim();
        if destination.is_empty() || destination.ends_with('/') {
            destination.to_string()
        } else {
            format!("{destination}/")
        }
    }

    fn provider_status(media: &MediaStatus) -> Map<String, Value> {
        let destination_status: Vec<&String> = media
            .formats
            .iter()
            .flat_map(|f| &f.destination_status)
            .collect();

        let mut bag = Map::new();
        bag.insert("progress".into(), Value::from(media.progress));
        bag.insert("sourcefile".into(), Value::from(media.sourcefile.as_str()));
        bag.insert("timeleft".into(), Value::from(media.time_left.as_str()));
        bag.insert("created".into(), Value::from(media.created.as_str()));
        bag.insert("started".into(), Value::from(media.started.as_str()));
        bag.insert("finished".into(), Value::from(media.finished.as_str()));
        bag.insert(
            "destinationStatus".into(),
            if destination_status.is_empty() {
                Value::Null
            } else {
                Value::from_iter(destination_status.into_iter().map(|s| Value::from(s.as_str())))
            },
        );
        bag
    }
}

fn output_files(media: &MediaStatus) -> Vec<OutputFile> {
    media
        .formats
        .iter()
        .flat_map(|format| &format.destination)
        .map(|path| {
            let container = path
                .rsplit('/')
                .next()
                .and_then(|file| file.rsplit_once('.'))
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_default();
            OutputFile {
                path: path.clone(),
                container,
                ..Default::default()
            }
        })
        .collect()
}

#[async_trait]
impl TranscodingProvider for EncodingComProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            &["mp4", "mov", "mkv", "avi", "webm", "flv", "ts"],
            &["mp4", "webm", "mov", "ts"],
            &["s3", "ftp", "sftp", "http"],
        )
    }

    async fn transcode(&self, source: &str, presets: &[Preset]) -> Result<JobStatus> {
        let mappings = require_mappings(NAME, presets)?;
        let root = self.destination_root();
        if root.is_empty() {
            return Err(Error::configuration(
                NAME,
                "destination is required to submit media",
            ));
        }
        let stem = source_stem(source);

        let formats: Vec<MediaFormat> = presets
            .iter()
            .zip(mappings)
            .map(|(preset, output)| MediaFormat {
                output: vec![output.to_string()],
                destination: vec![format!(
                    "{root}{}/{stem}.{}",
                    preset.name,
                    output_extension(preset.extension())
                )],
            })
            .collect();

        let added = self
            .api
            .add_media(&[source.to_string()], &formats, self.settings.region.as_deref())
            .await?;
        info!(media_id = %added.media_id, presets = formats.len(), "encoding.com media added");

        let mut job = JobStatus::new(NAME, &added.media_id, Status::Queued).with_destination(root);
        job.status_message = added.message;
        Ok(job)
    }

    async fn job_status(&self, provider_job_id: &str) -> Result<JobStatus> {
        let media = self.api.media_status(provider_job_id).await?;
        let status = STATUS_TABLE.translate(&media.status);

        let mut job = JobStatus::new(NAME, provider_job_id, status)
            .with_destination(self.destination_root());
        job.provider_status = Self::provider_status(&media);
        if status == Status::Failed {
            job.status_message = media.description.clone();
        }
        if status == Status::Finished {
            job.output.files = output_files(&media);
        }
        Ok(job)
    }

    async fn cancel_job(&self, provider_job_id: &str) -> Result<()> {
        self.api.cancel_media(provider_job_id).await
    }

    async fn healthcheck(&self) -> Result<()> {
        let status = self.api.api_status().await?;
        if status.status_code == "ok" {
            return Ok(());
        }
        Err(Error::Unhealthy(format!(
            "Status code: {}.\nIncident: {}\nStatus: {}",
            status.status_code, status.incident, status.status
        )))
    }

    async fn create_preset(&self, preset: &Preset) -> Result<String> {
        self.presets
            .create(preset)
            .await
            .map(|summary| summary.video_config_id)
    }

    async fn get_preset(&self, name: &str) -> Result<PresetSummary> {
        self.presets.get(name)
    }

    async fn delete_preset(&self, name: &str) -> Result<()> {
        self.presets.delete(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::client::{ApiStatus, FormatStatus};
    use super::fake::FakeEncodingCom;
    use super::*;
    use crate::config::Config;
    use crate::provider::store::testing::MemoryStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn settings() -> EncodingComConfig {
        EncodingComConfig {
            user_id: "myuser".into(),
            user_key: "secret-key".into(),
            destination: "https://mybucket.s3.amazonaws.com/destination-dir/".into(),
            ..Default::default()
        }
    }

    fn provider() -> (EncodingComProvider, Arc<FakeEncodingCom>) {
        let api = Arc::new(FakeEncodingCom::default());
        let provider =
            EncodingComProvider::new(api.clone(), Arc::new(MemoryStore::default()), settings());
        (provider, api)
    }

    fn preset(name: &str, mapping: &str, extension: &str) -> Preset {
        let mut preset = Preset {
            name: name.into(),
            container: extension.into(),
            ..Default::default()
        };
        preset.output.extension = extension.into();
        if !mapping.is_empty() {
            preset.provider_mapping = BTreeMap::from([(NAME.to_string(), mapping.to_string())]);
        }
        preset
    }

    #[test]
    fn status_vocabulary() {
        let cases = [
            ("New", Status::Queued),
            ("new", Status::Queued),
            ("Downloading", Status::Started),
            ("downloading", Status::Started),
            ("Ready to process", Status::Started),
            ("ready to process", Status::Started),
            ("Waiting for encoder", Status::Started),
            ("waiting for encoder", Status::Started),
            ("Processing", Status::Started),
            ("processing", Status::Started),
            ("Saving", Status::Started),
            ("saving", Status::Started),
            ("Finished", Status::Finished),
            ("finished", Status::Finished),
            ("Error", Status::Failed),
            ("error", Status::Failed),
            ("Unknown", Status::Unknown),
            ("unknown", Status::Unknown),
            ("Stopped", Status::Unknown),
        ];
        for (raw, expected) in cases {
            assert_eq!(STATUS_TABLE.translate(raw), expected, "{raw:?}");
        }
    }

    #[test]
    fn factory_requires_credentials() {
        let store: Arc<dyn SummaryStore> = Arc::new(MemoryStore::default());
        let mut config = Config::default();
        config.encodingcom = Some(EncodingComConfig {
            user_id: "myuser".into(),
            ..Default::default()
        });
        let ctx = ProviderContext {
            config: Arc::new(config.clone()),
            store: store.clone(),
        };
        let err = factory(&ctx).err().unwrap();
        assert_eq!(
            err.to_string(),
            "invalid encodingcom configuration: user_key is required"
        );

        // Credentials alone are enough to build the provider
        config.encodingcom = Some(EncodingComConfig {
            user_id: "myuser".into(),
            user_key: "secret-key".into(),
            ..Default::default()
        });
        let ctx = ProviderContext {
            config: Arc::new(config),
            store,
        };
        assert_eq!(factory(&ctx).unwrap().name(), "encodingcom");
    }

    #[tokio::test]
    async fn transcode_without_destination_submits_nothing() {
        let api = Arc::new(FakeEncodingCom::default());
        let provider = EncodingComProvider::new(
            api.clone(),
            Arc::new(MemoryStore::default()),
            EncodingComConfig {
                destination: String::new(),
                ..settings()
            },
        );

        let err = provider
            .transcode("http://host/video.mp4", &[preset("webm_720p", "123455", "webm")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
        assert!(api.media.lock().is_empty());
    }

    #[tokio::test]
    async fn transcode_one_format_per_preset() {
        let (provider, api) = provider();
        let source = "http://some.nice/video.mp4";
        let presets = vec![
            preset("webm_720p", "123455", "webm"),
            preset("hls_1080p", "321321", "ts"),
        ];

        let job = provider.transcode(source, &presets).await.unwrap();
        assert_eq!(job.provider_name, "encodingcom");
        assert_eq!(job.status, Status::Queued);
        assert_eq!(job.status_message, "it worked");
        assert_eq!(
            job.output.destination,
            "https://mybucket.s3.amazonaws.com/destination-dir/"
        );

        let media = api.media.lock();
        let submitted = &media[&job.provider_job_id];
        assert_eq!(submitted.source, vec![source]);
        assert_eq!(
            submitted.formats,
            vec![
                MediaFormat {
                    output: vec!["123455".into()],
                    destination: vec![
                        "https://mybucket.s3.amazonaws.com/destination-dir/webm_720p/video.webm"
                            .into()
                    ],
                },
                MediaFormat {
                    output: vec!["321321".into()],
                    destination: vec![
                        "https://mybucket.s3.amazonaws.com/destination-dir/hls_1080p/video.m3u8"
                            .into()
                    ],
                },
            ]
        );
    }

    #[tokio::test]
    async fn transcode_with_unmapped_preset_submits_nothing() {
        let (provider, api) = provider();
        let presets = vec![
            preset("webm_720p", "123455", "webm"),
            preset("webm_480p", "", "webm"),
        ];
        let err = provider
            .transcode("http://some.nice/video.mp4", &presets)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PresetNotFound { ref preset, .. } if preset == "webm_480p"));
        assert!(api.media.lock().is_empty());
    }

    #[tokio::test]
    async fn finished_media_status() {
        let (provider, api) = provider();
        api.set_status(
            "mymedia",
            MediaStatus {
                id: "mymedia".into(),
                status: "Finished".into(),
                progress: 100.0,
                sourcefile: "http://some.source.file".into(),
                time_left: "1".into(),
                created: "2024-03-01 10:00:00".into(),
                started: "2024-03-01 10:10:00".into(),
                finished: "2024-03-01 10:50:00".into(),
                description: String::new(),
                formats: vec![FormatStatus {
                    status: "Finished".into(),
                    output: "webm".into(),
                    destination: vec!["https://dest/webm_720p/video.webm".into()],
                    destination_status: Vec::new(),
                }],
            },
        );

        let job = provider.job_status("mymedia").await.unwrap();
        assert_eq!(job.provider_job_id, "mymedia");
        assert_eq!(job.status, Status::Finished);
        assert_eq!(job.status_message, "");
        assert_eq!(
            Value::Object(job.provider_status),
            json!({
                "progress": 100.0,
                "sourcefile": "http://some.source.file",
                "timeleft": "1",
                "created": "2024-03-01 10:00:00",
                "started": "2024-03-01 10:10:00",
                "finished": "2024-03-01 10:50:00",
                "destinationStatus": null
            })
        );
        assert_eq!(job.output.files.len(), 1);
        assert_eq!(job.output.files[0].path, "https://dest/webm_720p/video.webm");
        assert_eq!(job.output.files[0].container, "webm");
    }

    #[tokio::test]
    async fn failed_media_carries_description() {
        let (provider, api) = provider();
        api.set_status(
            "m-2",
            MediaStatus {
                status: "Error".into(),
                description: "Source file is not reachable".into(),
                ..Default::default()
            },
        );
        let job = provider.job_status("m-2").await.unwrap();
        assert_eq!(job.status, Status::Failed);
        assert_eq!(job.status_message, "Source file is not reachable");
        assert!(job.output.files.is_empty());
    }

    #[tokio::test]
    async fn unknown_media_is_an_error() {
        let (provider, _api) = provider();
        assert!(provider.job_status("idk").await.is_err());
    }

    #[tokio::test]
    async fn healthcheck_reports_incident() {
        let (provider, api) = provider();
        provider.healthcheck().await.unwrap();

        *api.api_status.lock() = ApiStatus {
            status: "Investigation".into(),
            status_code: "queue_slow".into(),
            incident: "Our encoding queue is processing slower than normal.".into(),
        };
        let err = provider.healthcheck().await.unwrap_err();
        assert!(matches!(err, Error::Unhealthy(_)));
        assert_eq!(
            err.to_string(),
            "Status code: queue_slow.\nIncident: Our encoding queue is processing slower than normal.\nStatus: Investigation"
        );
    }

    #[tokio::test]
    async fn presets_are_saved_remotely() {
        let (provider, api) = provider();
        let p = preset("mp4_720p", "", "mp4");

        assert_eq!(provider.create_preset(&p).await.unwrap(), "mp4_720p");
        assert!(api.presets.lock().contains_key("mp4_720p"));
        assert!(matches!(
            provider.create_preset(&p).await.unwrap_err(),
            Error::Conflict(_)
        ));

        provider.delete_preset("mp4_720p").await.unwrap();
        assert!(api.presets.lock().is_empty());
        assert!(provider.get_preset("mp4_720p").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cancel_media() {
        let (provider, api) = provider();
        let job = provider
            .transcode("http://host/clip.mov", &[preset("webm_720p", "1", "webm")])
            .await
            .unwrap();
        provider.cancel_job(&job.provider_job_id).await.unwrap();
        assert_eq!(*api.canceled.lock(), vec![job.provider_job_id]);
        assert!(provider.cancel_job("nope").await.unwrap_err().is_not_found());
    }
}
