//! Codec configurations: the remote half of a Bitmovin preset.

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_common::{Error, Preset, PresetSummary, Result};
use tracing::{error, warn};

use super::api::{AudioCodec, AudioConfig, BitmovinApi, VideoCodec, VideoConfig};
use crate::provider::enrichment::MuxingKind;
use crate::provider::lifecycle::ConfigBackend;

/// Creates one video and at most one audio codec configuration per preset.
pub struct CodecConfigs {
    api: Arc<dyn BitmovinApi>,
}

impl CodecConfigs {
    pub fn new(api: Arc<dyn BitmovinApi>) -> Self {
        Self { api }
    }
}

fn video_config(preset: &Preset, codec: VideoCodec) -> VideoConfig {
    let video = &preset.video;
    let mut config = VideoConfig {
        name: preset.name.clone(),
        bitrate: video.bitrate,
        width: video.width,
        height: video.height,
        ..Default::default()
    };

    if codec == VideoCodec::H264 {
        config.profile = Some(video.profile.to_ascii_uppercase()).filter(|p| !p.is_empty());
        config.level = Some(video.profile_level.clone()).filter(|l| !l.is_empty());
        if let Some(gop) = video.gop_size.filter(|g| *g > 0) {
            config.max_gop = Some(gop);
            if video.gop_mode.eq_ignore_ascii_case("fixed") {
                config.min_gop = Some(gop);
            }
        }
    }

    config
}

#[async_trait]
impl ConfigBackend for CodecConfigs {
    async fn create_config(&self, preset: &Preset) -> Result<PresetSummary> {
        let video_codec = VideoCodec::parse(&preset.video.codec).ok_or_else(|| {
            Error::Validation(format!(
                "video codec {:?} is not supported by bitmovin",
                preset.video.codec
            ))
        })?;
        let audio_codec = match preset.audio.codec.trim() {
            "" => None,
            codec => Some(AudioCodec::parse(codec).ok_or_else(|| {
                Error::Validation(format!("audio codec {codec:?} is not supported by bitmovin"))
            })?),
        };
        if MuxingKind::for_container(&preset.container).is_none() {
            return Err(Error::Validation(format!(
                "container {:?} is not supported by bitmovin",
                preset.container
            )));
        }

        let video_id = self
            .api
            .create_video_config(video_codec, &video_config(preset, video_codec))
            .await?;

        let audio_id = match audio_codec {
            None => None,
            Some(codec) => {
                let config = AudioConfig {
                    name: preset.name.clone(),
                    bitrate: preset.audio.bitrate,
                };
                match self.api.create_audio_config(codec, &config).await {
                    Ok(id) => Some(id),
                    Err(audio_err) => {
                        warn!(preset = %preset.name, video_config_id = %video_id, error = %audio_err,
                            "audio config failed, removing video config");
                        if let Err(cleanup_err) =
                            self.api.delete_video_config(video_codec, &video_id).await
                        {
                            error!(preset = %preset.name, video_config_id = %video_id,
                                error = %cleanup_err, "video config left behind");
                            return Err(Error::inconsistency(
                                format!("creating preset {:?}", preset.name),
                                format!(
                                    "{audio_err}; video config {video_id} could not be removed: {cleanup_err}"
                                ),
                            ));
                        }
                        return Err(audio_err);
                    }
                }
            }
        };

        Ok(PresetSummary {
            provider: super::NAME.to_string(),
            name: preset.name.clone(),
            container: preset.container.to_ascii_lowercase(),
            video_codec: video_codec.as_str().to_string(),
            video_config_id: video_id,
            audio_codec: audio_codec.map(|c| c.as_str().to_string()),
            audio_config_id: audio_id,
        })
    }

    /// Audio goes first. A config that is already gone counts as deleted, so
    /// a retry after a partial delete can finish the job.
    async fn delete_config(&self, summary: &PresetSummary) -> Result<()> {
        let video_codec = VideoCodec::parse(&summary.video_codec).ok_or_else(|| {
            Error::Internal(format!(
                "preset summary {:?} has unknown video codec {:?}",
                summary.name, summary.video_codec
            ))
        })?;

        if let (Some(codec), Some(id)) = (&summary.audio_codec, &summary.audio_config_id) {
            let codec = AudioCodec::parse(codec).ok_or_else(|| {
                Error::Internal(format!(
                    "preset summary {:?} has unknown audio codec {codec:?}",
                    summary.name
                ))
            })?;
            tolerate_missing(self.api.delete_audio_config(codec, id).await)?;
        }

        tolerate_missing(
            self.api
                .delete_video_config(video_codec, &summary.video_config_id)
                .await,
        )
    }
}

fn tolerate_missing(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            warn!(error = %e, "config already removed");
            Ok(())
        }
        other => other,
    }
}
