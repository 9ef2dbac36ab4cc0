//! Saved presets: the remote half of an Encoding.com preset.

use std::sync::Arc;

use async_trait::async_trait;
use orchestrator_common::{Error, Preset, PresetSummary, Result};
use tracing::warn;

use super::client::{EncodingComApi, PresetFormat};
use crate::provider::lifecycle::ConfigBackend;

pub struct SavedPresets {
    api: Arc<dyn EncodingComApi>,
}

impl SavedPresets {
    pub fn new(api: Arc<dyn EncodingComApi>) -> Self {
        Self { api }
    }
}

fn output_name(container: &str) -> Option<&'static str> {
    match container.to_ascii_lowercase().as_str() {
        "mp4" => Some("mp4"),
        "webm" => Some("webm"),
        "mov" => Some("mov"),
        "ts" | "m3u8" | "hls" => Some("advanced_hls"),
        _ => None,
    }
}

fn video_codec(codec: &str) -> Option<String> {
    let name = match codec.to_ascii_lowercase().as_str() {
        "" => return None,
        "h264" | "avc" => "libx264",
        "hevc" | "h265" => "libx265",
        "vp8" => "libvpx",
        "vp9" => "libvpx-vp9",
        other => return Some(other.to_string()),
    };
    Some(name.to_string())
}

fn audio_codec(codec: &str) -> Option<String> {
    let name = match codec.to_ascii_lowercase().as_str() {
        "" => return None,
        "aac" => "libfdk_aac",
        "vorbis" => "libvorbis",
        "opus" => "libopus",
        other => return Some(other.to_string()),
    };
    Some(name.to_string())
}

/// Bits per second as Encoding.com's `<kbps>k`.
fn kbps(bitrate: Option<u64>) -> Option<String> {
    bitrate.filter(|b| *b > 0).map(|b| format!("{}k", b / 1000))
}

pub(crate) fn preset_format(preset: &Preset) -> Result<PresetFormat> {
    let output = output_name(&preset.container).ok_or_else(|| {
        Error::Validation(format!(
            "container {:?} is not supported by encoding.com",
            preset.container
        ))
    })?;
    let video = &preset.video;

    let size = match (video.width, video.height) {
        (None, None) => None,
        (w, h) => Some(format!("{}x{}", w.unwrap_or(0), h.unwrap_or(0))),
    };

    Ok(PresetFormat {
        output: output.to_string(),
        video_codec: video_codec(&video.codec),
        audio_codec: audio_codec(&preset.audio.codec),
        bitrate: kbps(video.bitrate),
        audio_bitrate: kbps(preset.audio.bitrate),
        size,
        profile: Some(video.profile.to_ascii_lowercase()).filter(|p| !p.is_empty()),
        keyframe: video.gop_size.filter(|g| *g > 0).map(|g| g.to_string()),
    })
}

#[async_trait]
impl ConfigBackend for SavedPresets {
    async fn create_config(&self, preset: &Preset) -> Result<PresetSummary> {
        let format = preset_format(preset)?;
        let saved = self.api.save_preset(&preset.name, &format).await?;

        Ok(PresetSummary {
            provider: super::NAME.to_string(),
            name: preset.name.clone(),
            container: preset.container.to_ascii_lowercase(),
            video_codec: preset.video.codec.to_ascii_lowercase(),
            video_config_id: saved,
            audio_codec: Some(preset.audio.codec.to_ascii_lowercase()).filter(|c| !c.is_empty()),
            audio_config_id: None,
        })
    }

    async fn delete_config(&self, summary: &PresetSummary) -> Result<()> {
        match self.api.delete_preset(&summary.video_config_id).await {
            Err(e) if e.is_not_found() => {
                warn!(preset = %summary.name, error = %e, "saved preset already removed");
                Ok(())
            }
            other => other,
        }
    }
}
