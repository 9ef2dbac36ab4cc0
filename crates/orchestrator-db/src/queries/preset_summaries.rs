//! Preset summary query operations.
//!
//! One row per `(provider, name)`. Inserts never overwrite: a second insert
//! for the same key fails with [`Error::Conflict`], which is how two
//! concurrent creates for one preset detect each other.

use orchestrator_common::{Error, PresetSummary, Result};
use rusqlite::{params, Connection, ErrorCode};

/// Insert a new summary. Fails with [`Error::Conflict`] if the provider
/// already has a summary under that name.
pub fn insert_summary(conn: &Connection, summary: &PresetSummary) -> Result<()> {
    conn.execute(
        "INSERT INTO preset_summaries
            (provider, name, container, video_codec, video_config_id, audio_codec, audio_config_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            &summary.provider,
            &summary.name,
            &summary.container,
            &summary.video_codec,
            &summary.video_config_id,
            &summary.audio_codec,
            &summary.audio_config_id,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            Error::Conflict(format!(
                "{} preset summary {:?} already exists",
                summary.provider, summary.name
            ))
        }
        _ => Error::database(e),
    })?;

    Ok(())
}

/// Get `provider`'s summary for a preset name.
pub fn get_summary(conn: &Connection, provider: &str, name: &str) -> Result<PresetSummary> {
    conn.query_row(
        "SELECT provider, name, container, video_codec, video_config_id, audio_codec, audio_config_id
         FROM preset_summaries WHERE provider = ? AND name = ?",
        [provider, name],
        |row| {
            Ok(PresetSummary {
                provider: row.get(0)?,
                name: row.get(1)?,
                container: row.get(2)?,
                video_codec: row.get(3)?,
                video_config_id: row.get(4)?,
                audio_codec: row.get(5)?,
                audio_config_id: row.get(6)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Error::not_found("preset summary", name),
        _ => Error::database(e),
    })
}

/// Delete `provider`'s summary for a preset name. Fails with
/// [`Error::NotFound`] if absent.
pub fn delete_summary(conn: &Connection, provider: &str, name: &str) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM preset_summaries WHERE provider = ? AND name = ?",
            [provider, name],
        )
        .map_err(Error::database)?;

    if deleted == 0 {
        return Err(Error::not_found("preset summary", name));
    }
    Ok(())
}
