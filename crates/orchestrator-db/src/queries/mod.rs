//! Database query modules.
//!
//! - preset_summaries: local records of provider-side preset configurations
//! - jobs: job index (local ID to provider job ID)

pub mod jobs;
pub mod preset_summaries;
