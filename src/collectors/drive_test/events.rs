use std::time::Duration;

use super::errors::{FailureClass, SkipReason};
use crate::models::{DriveSample, ProbeKind};

/// Published to every subscriber of a collector
#[derive(Debug, Clone)]
pub enum CollectorEvent {
    Started {
        interval: Duration,
        probes: Vec<ProbeKind>,
    },
    SampleCollected {
        sample_number: u64,
        sample: DriveSample,
        preview: String,
    },
    TickSkipped {
        tick: u64,
        reason: SkipReason,
        class: FailureClass,
    },
    Stopped {
        total_samples: u64,
    },
}

/// Latest collector state, readable at any time without blocking the loop
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorStatus {
    pub active: bool,
    pub samples_collected: u64,
    /// Preview of the most recent sample
    pub last_preview: Option<String>,
    pub message: String,
}

impl CollectorStatus {
    pub fn idle() -> Self {
        Self {
            active: false,
            samples_collected: 0,
            last_preview: None,
            message: "Drive test idle".to_string(),
        }
    }

    pub fn collecting(samples_collected: u64, last_preview: Option<String>) -> Self {
        Self {
            active: true,
            samples_collected,
            last_preview,
            message: format!("Collecting data... {samples_collected} samples"),
        }
    }

    pub fn stopped(total_samples: u64, last_preview: Option<String>) -> Self {
        Self {
            active: false,
            samples_collected: total_samples,
            last_preview,
            message: format!("Drive test stopped. {total_samples} samples collected"),
        }
    }
}

impl Default for CollectorStatus {
    fn default() -> Self {
        Self::idle()
    }
}
