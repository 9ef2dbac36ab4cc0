//! Output enrichment: turning a job's muxing records into [`OutputFile`]s.

use async_trait::async_trait;
use orchestrator_common::{JobStatus, OutputFile, RemoteContext, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pagination::{collect_all, Page};

/// A mechanism by which a provider produces output containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MuxingKind {
    Mp4,
    ProgressiveWebm,
}

impl MuxingKind {
    /// URL path segment under `/muxings/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            MuxingKind::Mp4 => "mp4",
            MuxingKind::ProgressiveWebm => "progressive-webm",
        }
    }

    /// Human-readable name used in error context.
    pub fn label(&self) -> &'static str {
        match self {
            MuxingKind::Mp4 => "MP4 muxings",
            MuxingKind::ProgressiveWebm => "progressive WebM muxings",
        }
    }

    /// Muxing kind that produces `container`, if any.
    pub fn for_container(container: &str) -> Option<Self> {
        match container.to_ascii_lowercase().as_str() {
            "mp4" => Some(MuxingKind::Mp4),
            "webm" => Some(MuxingKind::ProgressiveWebm),
            _ => None,
        }
    }
}

/// A muxing record as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Muxing {
    pub id: String,
    pub filename: String,
}

/// Per-muxing metadata. Missing upstream values stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuxingInformation {
    pub container_format: Option<String>,
    pub file_size: Option<u64>,
    pub video_tracks: Vec<VideoTrack>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoTrack {
    pub codec: Option<String>,
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
}

/// Remote calls the pipeline needs.
#[async_trait]
pub trait MuxingSource: Send + Sync {
    async fn list_muxings(
        &self,
        job_id: &str,
        kind: MuxingKind,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Muxing>>;

    async fn muxing_information(
        &self,
        job_id: &str,
        kind: MuxingKind,
        muxing_id: &str,
    ) -> Result<MuxingInformation>;
}

/// Fill `status.output.files` from every muxing of every kind in `kinds`.
///
/// Listing and per-item fetches are sequential; files are appended in
/// collection order, kind by kind. Any failure aborts the whole call and the
/// shell is dropped, so the caller never sees a partial file list.
pub async fn enrich_outputs<S>(
    source: &S,
    kinds: &[MuxingKind],
    page_size: u32,
    mut status: JobStatus,
) -> Result<JobStatus>
where
    S: MuxingSource + ?Sized,
{
    let job_id = status.provider_job_id.clone();
    let mut files = Vec::new();

    for &kind in kinds {
        let muxings = collect_all(kind.label(), page_size, |offset, limit| {
            source.list_muxings(&job_id, kind, offset, limit)
        })
        .await?;
        debug!(job_id = %job_id, kind = kind.path_segment(), count = muxings.len(), "listed muxings");

        for muxing in muxings {
            let info = source
                .muxing_information(&job_id, kind, &muxing.id)
                .await
                .with_remote_context(|| {
                    format!("retrieving muxing information with ID {:?}", muxing.id)
                })?;
            files.push(output_file(&status.output.destination, &muxing, info));
        }
    }

    status.output.files.extend(files);
    Ok(status)
}

fn output_file(destination: &str, muxing: &Muxing, info: MuxingInformation) -> OutputFile {
    let track = info.video_tracks.into_iter().next().unwrap_or_default();
    OutputFile {
        path: format!("{}{}", destination, muxing.filename),
        container: info.container_format.unwrap_or_default(),
        video_codec: track.codec.unwrap_or_default(),
        width: track.frame_width.unwrap_or(0),
        height: track.frame_height.unwrap_or(0),
        file_size: info.file_size.unwrap_or(0),
    }
}
