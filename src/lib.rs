//! Polaris drive-test collector
//!
//! Periodically samples the registered cell, a location fix and a set of
//! network probes, and stores each merged sample for export or upload.

pub mod cli;
pub mod collectors;
pub mod config;
pub mod export;
pub mod models;
pub mod remote;
pub mod storage;
