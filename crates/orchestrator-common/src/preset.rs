//! Preset types: the caller's encode intent and the persisted summary that
//! binds it to provider-side configuration resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Caller-supplied encode intent.
///
/// `name` is the unique key. `provider_mapping` holds one opaque value per
/// provider name (a provider-side preset ID, or the name of a stored
/// [`PresetSummary`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub container: String,
    #[serde(default)]
    pub rate_control: String,
    #[serde(default)]
    pub video: VideoPreset,
    #[serde(default)]
    pub audio: AudioPreset,
    #[serde(default)]
    pub provider_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputOptions,
}

/// Video parameters of a [`Preset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPreset {
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub profile_level: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Target bitrate in bits per second.
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub gop_size: Option<u32>,
    #[serde(default)]
    pub gop_mode: String,
    #[serde(default)]
    pub interlace_mode: String,
}

/// Audio parameters of a [`Preset`]. An empty codec means no audio track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioPreset {
    #[serde(default)]
    pub codec: String,
    /// Target bitrate in bits per second.
    #[serde(default)]
    pub bitrate: Option<u64>,
}

/// Output options of a [`Preset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    #[serde(default)]
    pub extension: String,
}

impl Preset {
    /// Look up the value this preset carries for `provider`.
    pub fn mapping_for(&self, provider: &str) -> Option<&str> {
        self.provider_mapping
            .get(provider)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// File extension for outputs of this preset, falling back to the container.
    pub fn extension(&self) -> &str {
        if self.output.extension.is_empty() {
            &self.container
        } else {
            &self.output.extension
        }
    }

    /// Reject presets that cannot be turned into provider resources.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("preset name is required".into()));
        }
        if self.name.contains('/') {
            return Err(Error::Validation(format!(
                "preset name {:?} must not contain '/'",
                self.name
            )));
        }
        if self.container.trim().is_empty() {
            return Err(Error::Validation(format!(
                "preset {:?} has no container",
                self.name
            )));
        }
        Ok(())
    }
}

/// Persisted record of the provider-side configuration a preset produced.
///
/// Created only after the remote create succeeded and deleted only after the
/// remote delete succeeded. Keyed by `(provider, name)`: the same preset name
/// may be configured on several providers, each with its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    /// Provider that owns the remote configuration.
    pub provider: String,
    pub name: String,
    pub container: String,
    pub video_codec: String,
    pub video_config_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_config_id: Option<String>,
}
