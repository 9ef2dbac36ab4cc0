//! Canonical job-status model shared by every provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::JobId;

/// Canonical job status. Unknown provider vocabulary maps to [`Status::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Queued,
    Started,
    Finished,
    Failed,
    #[default]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Started => "started",
            Status::Finished => "finished",
            Status::Failed => "failed",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a provider-owned job, recomputed on every status query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Local job index ID, set by the job facade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub provider_job_id: String,
    pub provider_name: String,
    pub status: Status,
    #[serde(default)]
    pub status_message: String,
    /// Raw provider fields passed through for diagnostics.
    #[serde(default)]
    pub provider_status: Map<String, Value>,
    #[serde(default)]
    pub output: Output,
}

impl JobStatus {
    /// A status shell for `provider_job_id` with no message, bag or outputs.
    pub fn new(
        provider_name: impl Into<String>,
        provider_job_id: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            job_id: None,
            provider_job_id: provider_job_id.into(),
            provider_name: provider_name.into(),
            status,
            status_message: String::new(),
            provider_status: Map::new(),
            output: Output::default(),
        }
    }

    /// Set the output destination root.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.output.destination = destination.into();
        self
    }
}

/// Where a job writes and what it has produced so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub destination: String,
    /// Files in discovery order.
    #[serde(default)]
    pub files: Vec<OutputFile>,
}

/// One produced file, assembled from provider metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub path: String,
    pub container: String,
    pub video_codec: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}
