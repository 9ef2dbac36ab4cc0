//! Local preset-summary store.

use orchestrator_common::{PresetSummary, Result};
use orchestrator_db::pool::{get_conn, DbPool};
use orchestrator_db::queries::preset_summaries;

/// Key-value store of [`PresetSummary`] keyed by `(provider, name)`.
///
/// `put` never overwrites: a second `put` for the same key fails with
/// [`orchestrator_common::Error::Conflict`]. `get` and `delete` fail with
/// [`orchestrator_common::Error::NotFound`] when the provider has no summary
/// under that name, even if another provider has one.
pub trait SummaryStore: Send + Sync {
    fn put(&self, summary: &PresetSummary) -> Result<()>;
    fn get(&self, provider: &str, name: &str) -> Result<PresetSummary>;
    fn delete(&self, provider: &str, name: &str) -> Result<()>;
}

/// [`SummaryStore`] backed by the SQLite `preset_summaries` table.
#[derive(Clone)]
pub struct SqliteSummaryStore {
    pool: DbPool,
}

impl SqliteSummaryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SummaryStore for SqliteSummaryStore {
    fn put(&self, summary: &PresetSummary) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        preset_summaries::insert_summary(&conn, summary)
    }

    fn get(&self, provider: &str, name: &str) -> Result<PresetSummary> {
        let conn = get_conn(&self.pool)?;
        preset_summaries::get_summary(&conn, provider, name)
    }

    fn delete(&self, provider: &str, name: &str) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        preset_summaries::delete_summary(&conn, provider, name)
    }
}
