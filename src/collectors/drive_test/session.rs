use log::warn;
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use super::errors::CollectorError;
use crate::models::{DriveSample, ProbeKind, ProbeTargets};
use crate::storage::{SampleStore, StoreError};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CELL_TIMEOUT: Duration = Duration::from_secs(10);

/// Samples kept in memory while the store rejects writes
pub const BACKLOG_CAPACITY: usize = 256;

/// What a drive test measures and how often
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub probes: BTreeSet<ProbeKind>,
    pub targets: ProbeTargets,
    pub interval: Duration,
    /// Upper bound on waiting for one location fix
    pub location_timeout: Duration,
    /// Upper bound on one cell snapshot read
    pub cell_timeout: Duration,
}

impl SessionConfig {
    pub fn new(probes: BTreeSet<ProbeKind>, targets: ProbeTargets) -> Self {
        Self {
            probes,
            targets,
            interval: DEFAULT_INTERVAL,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            cell_timeout: DEFAULT_CELL_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn with_cell_timeout(mut self, timeout: Duration) -> Self {
        self.cell_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.interval < MIN_INTERVAL || self.interval > MAX_INTERVAL {
            return Err(CollectorError::InvalidInterval(self.interval));
        }
        if self.location_timeout.is_zero() {
            return Err(CollectorError::InvalidLocationTimeout);
        }
        if self.cell_timeout.is_zero() {
            return Err(CollectorError::InvalidCellTimeout);
        }
        Ok(())
    }
}

/// Bounded FIFO of samples that could not be persisted yet
#[derive(Debug)]
pub struct PendingBacklog {
    samples: VecDeque<DriveSample>,
    capacity: usize,
    dropped: u64,
}

impl PendingBacklog {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Queues a sample, evicting the oldest one when full
    pub fn push(&mut self, sample: DriveSample) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.samples.len() >= self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.dropped += 1;
                warn!(
                    "Sample backlog full ({}), dropping sample taken at {}",
                    self.capacity, evicted.timestamp
                );
            }
        }
        self.samples.push_back(sample);
    }

    /// Writes every queued sample in one batch; on failure they stay queued
    pub fn flush(&mut self, store: &dyn SampleStore) -> Result<usize, StoreError> {
        if self.samples.is_empty() {
            return Ok(0);
        }
        let batch: Vec<DriveSample> = self.samples.iter().cloned().collect();
        store.insert_batch(&batch)?;
        self.samples.clear();
        Ok(batch.len())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// State owned by the collection loop for one start/stop cycle; never persisted
#[derive(Debug)]
pub struct CollectionSession {
    pub config: SessionConfig,
    /// Ticks started so far, including skipped ones
    pub ticks: u64,
    /// Samples persisted so far
    pub samples_collected: u64,
    pub backlog: PendingBacklog,
}

impl CollectionSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ticks: 0,
            samples_collected: 0,
            backlog: PendingBacklog::new(BACKLOG_CAPACITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellMeasurement, Location};
    use std::collections::BTreeMap;

    fn sample(timestamp: i64) -> DriveSample {
        DriveSample::merge(
            "device",
            timestamp,
            Location::new(0.0, 0.0),
            CellMeasurement::default(),
            &BTreeMap::new(),
            "",
        )
    }

    #[test]
    fn test_interval_bounds() {
        let config = SessionConfig::new(BTreeSet::new(), ProbeTargets::default());
        assert!(config.validate().is_ok());
        assert!(config.clone().with_interval(MAX_INTERVAL).validate().is_ok());
        assert!(matches!(
            config.clone().with_interval(Duration::ZERO).validate(),
            Err(CollectorError::InvalidInterval(_))
        ));
        assert!(matches!(
            config.clone().with_interval(Duration::from_secs(3601)).validate(),
            Err(CollectorError::InvalidInterval(_))
        ));
        assert!(matches!(
            config.clone().with_location_timeout(Duration::ZERO).validate(),
            Err(CollectorError::InvalidLocationTimeout)
        ));
        assert!(matches!(
            config.with_cell_timeout(Duration::ZERO).validate(),
            Err(CollectorError::InvalidCellTimeout)
        ));
    }

    #[test]
    fn test_backlog_drops_oldest_when_full() {
        let mut backlog = PendingBacklog::new(2);
        backlog.push(sample(1));
        backlog.push(sample(2));
        backlog.push(sample(3));

        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.dropped(), 1);
        let kept: Vec<i64> = backlog.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(kept, vec![2, 3]);
    }
}
