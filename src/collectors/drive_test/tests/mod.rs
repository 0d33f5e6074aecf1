//! Tests for drive-test collection
//!
//! Platform capabilities, probes and the store are replaced by in-memory
//! fakes from `support`; the clock is paused so interval sleeps are instant.

pub mod lifecycle_tests;
pub mod support;
