//! Orchestrator-DB: schema, migrations, and query operations
//!
//! SQLite persistence for the orchestrator using rusqlite and r2d2 connection
//! pooling. Two tables matter: `preset_summaries`, the local half of the
//! preset configuration lifecycle keyed by provider and preset name, and
//! `jobs`, the index that maps a local job ID to the provider that owns it.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Row models that are not shared domain types
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use orchestrator_db::pool::{get_conn, init_pool};
//! use orchestrator_db::queries::preset_summaries;
//!
//! let pool = init_pool("/var/lib/transcode-orchestrator/db.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let summary = preset_summaries::get_summary(&conn, "bitmovin", "webm_720p").unwrap();
//! println!("video config: {}", summary.video_config_id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
