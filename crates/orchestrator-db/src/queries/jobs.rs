//! Job index query operations.

use chrono::{DateTime, Utc};
use orchestrator_common::{Error, JobId, Result};
use rusqlite::{params, Connection};

use crate::models::JobRecord;

/// Record that `provider_name` owns `provider_job_id` under a new local ID.
pub fn create_job(
    conn: &Connection,
    provider_name: &str,
    provider_job_id: &str,
    source: &str,
) -> Result<JobRecord> {
    let record = JobRecord {
        id: JobId::new(),
        provider_name: provider_name.to_string(),
        provider_job_id: provider_job_id.to_string(),
        source: source.to_string(),
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO jobs (id, provider_name, provider_job_id, source, created_at)
         VALUES (?, ?, ?, ?, ?)",
        params![
            record.id.to_string(),
            &record.provider_name,
            &record.provider_job_id,
            &record.source,
            record.created_at.to_rfc3339(),
        ],
    )
    .map_err(Error::database)?;

    Ok(record)
}

/// Get a job index row by local ID.
pub fn get_job(conn: &Connection, id: JobId) -> Result<JobRecord> {
    conn.query_row(
        "SELECT provider_name, provider_job_id, source, created_at FROM jobs WHERE id = ?",
        [id.to_string()],
        |row| {
            Ok(JobRecord {
                id,
                provider_name: row.get(0)?,
                provider_job_id: row.get(1)?,
                source: row.get(2)?,
                created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found("job", id),
        _ => Error::database(e),
    })
}
