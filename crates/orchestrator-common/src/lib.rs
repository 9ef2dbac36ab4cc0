//! Orchestrator-Common: shared types and errors.
//!
//! - **Presets**: [`Preset`] (caller intent) and [`PresetSummary`] (persisted
//!   binding to provider-side configuration IDs)
//! - **Jobs**: the canonical [`JobStatus`] snapshot, [`Status`] and
//!   [`OutputFile`]
//! - **Typed IDs**: [`JobId`]
//! - **Error Handling**: [`Error`], [`Result`] and the [`RemoteContext`]
//!   extension for wrapping remote failures
//!
//! # Examples
//!
//! ```
//! use orchestrator_common::{Error, JobStatus, Result, Status};
//!
//! let status = JobStatus::new("bitmovin", "enc-1", Status::Queued);
//! assert_eq!(status.status.as_str(), "queued");
//!
//! fn lookup() -> Result<()> {
//!     Err(Error::not_found("job", "abc"))
//! }
//! assert!(lookup().unwrap_err().is_not_found());
//! ```

pub mod error;
pub mod ids;
pub mod job;
pub mod preset;

pub use error::{BoxError, Error, RemoteContext, Result};
pub use ids::JobId;
pub use job::{JobStatus, Output, OutputFile, Status};
pub use preset::{AudioPreset, OutputOptions, Preset, PresetSummary, VideoPreset};
