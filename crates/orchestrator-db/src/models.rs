//! Row models for tables that have no counterpart in `orchestrator-common`.

use chrono::{DateTime, Utc};
use orchestrator_common::JobId;

/// Job index row: which provider owns a job, and under which remote ID.
///
/// Holds no status; status is always recomputed from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub provider_name: String,
    pub provider_job_id: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}
