//! Muxing assembly for one output of an encoding.

use super::api::{AclEntry, EncodingOutput, MuxingStream, NewMuxing};
use crate::provider::enrichment::MuxingKind;

/// Build parameters for one muxing. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerConfig {
    pub encoding_id: String,
    pub output_id: String,
    /// Path under the output root, e.g. `<encoding id>/`.
    pub destination_path: String,
    /// File name relative to `destination_path`.
    pub filename: String,
    pub video_stream_id: String,
    pub audio_stream_id: Option<String>,
}

/// Describe the muxing `kind` should create for `config`.
pub fn assemble(kind: MuxingKind, config: &AssemblerConfig) -> NewMuxing {
    let streams = std::iter::once(&config.video_stream_id)
        .chain(config.audio_stream_id.as_ref())
        .map(|id| MuxingStream {
            stream_id: id.clone(),
        })
        .collect();

    let stream_conditions_mode = match kind {
        MuxingKind::Mp4 => None,
        MuxingKind::ProgressiveWebm => Some("DROP_STREAM".to_string()),
    };

    NewMuxing {
        filename: config.filename.clone(),
        streams,
        outputs: vec![EncodingOutput {
            output_id: config.output_id.clone(),
            output_path: config.destination_path.clone(),
            acl: vec![AclEntry {
                permission: "PUBLIC_READ".to_string(),
            }],
        }],
        stream_conditions_mode,
    }
}
