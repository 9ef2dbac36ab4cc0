//! Transcode orchestrator: one job and preset model over several cloud
//! video encoding providers.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod provider;
pub mod providers;
pub mod server;
pub mod service;
