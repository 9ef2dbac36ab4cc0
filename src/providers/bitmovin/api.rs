//! Bitmovin REST API surface used by the provider, and its request models.
//!
//! [`BitmovinApi`] is implemented over HTTP by
//! [`HttpBitmovinApi`](super::client::HttpBitmovinApi) and by an in-memory
//! fake in tests. Every method returns a fully wrapped [`Error`] naming the
//! operation that failed.
//!
//! [`Error`]: orchestrator_common::Error

use async_trait::async_trait;
use orchestrator_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::provider::enrichment::{MuxingKind, MuxingSource};

/// Video codec configuration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    H264,
    Vp8,
}

impl VideoCodec {
    pub fn parse(codec: &str) -> Option<Self> {
        match codec.to_ascii_lowercase().as_str() {
            "h264" | "avc" => Some(VideoCodec::H264),
            "vp8" => Some(VideoCodec::Vp8),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Vp8 => "vp8",
        }
    }
}

/// Audio codec configuration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Aac,
    Opus,
    Vorbis,
}

impl AudioCodec {
    pub fn parse(codec: &str) -> Option<Self> {
        match codec.to_ascii_lowercase().as_str() {
            "aac" => Some(AudioCodec::Aac),
            "opus" => Some(AudioCodec::Opus),
            "vorbis" => Some(AudioCodec::Vorbis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Opus => "opus",
            AudioCodec::Vorbis => "vorbis",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// H.264 only: `BASELINE`, `MAIN` or `HIGH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// H.264 only, e.g. `L3_1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_gop: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gop: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
}

/// An HTTP(S) input pointing at the source host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInput {
    #[serde(skip)]
    pub secure: bool,
    pub name: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEncoding {
    pub name: String,
    pub cloud_region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStream {
    pub codec_config_id: String,
    pub input_streams: Vec<InputStream>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputStream {
    pub input_id: String,
    pub input_path: String,
    pub selection_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMuxing {
    pub filename: String,
    pub streams: Vec<MuxingStream>,
    pub outputs: Vec<EncodingOutput>,
    /// Progressive WebM only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_conditions_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MuxingStream {
    pub stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingOutput {
    pub output_id: String,
    pub output_path: String,
    pub acl: Vec<AclEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AclEntry {
    pub permission: String,
}

/// Encoding task status as reported by `GET /encoding/encodings/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingStatus {
    /// Raw status string, e.g. `RUNNING`.
    pub status: String,
    /// Text of the first `ERROR` message, if any.
    pub error_message: Option<String>,
    /// Every field of the task object, verbatim.
    pub raw: Map<String, Value>,
}

#[async_trait]
pub trait BitmovinApi: MuxingSource {
    async fn create_video_config(&self, codec: VideoCodec, config: &VideoConfig) -> Result<String>;

    async fn delete_video_config(&self, codec: VideoCodec, id: &str) -> Result<()>;

    async fn create_audio_config(&self, codec: AudioCodec, config: &AudioConfig) -> Result<String>;

    async fn delete_audio_config(&self, codec: AudioCodec, id: &str) -> Result<()>;

    async fn create_input(&self, input: &HttpInput) -> Result<String>;

    async fn create_encoding(&self, encoding: &NewEncoding) -> Result<String>;

    async fn create_stream(&self, encoding_id: &str, stream: &NewStream) -> Result<String>;

    async fn create_muxing(
        &self,
        encoding_id: &str,
        kind: MuxingKind,
        muxing: &NewMuxing,
    ) -> Result<String>;

    async fn start_encoding(&self, encoding_id: &str) -> Result<()>;

    async fn stop_encoding(&self, encoding_id: &str) -> Result<()>;

    async fn encoding_status(&self, encoding_id: &str) -> Result<EncodingStatus>;

    /// Authenticated account lookup used as the health probe.
    async fn account_information(&self) -> Result<()>;
}
