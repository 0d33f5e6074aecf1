//! In-memory fakes shared by the drive-test tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collectors::drive_test::{DriveTestCollector, SessionConfig};
use crate::collectors::platform::{Accuracy, CellInfoSource, LocationProvider, PermissionState};
use crate::collectors::probes::{NetworkProbeSuite, Probe};
use crate::collectors::radio::{CapabilityLevel, CellSnapshot, LteCell, RadioCell};
use crate::models::{DriveSample, Location, ProbeKind, ProbeResult, ProbeTargets};
use crate::storage::{SampleStore, StoreError};

pub const DEVICE_ID: &str = "test-device";

pub struct FakeLocation {
    pub permission: PermissionState,
    pub enabled: bool,
    pub fix: Option<Location>,
}

impl FakeLocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            permission: PermissionState::Granted,
            enabled: true,
            fix: Some(Location::new(latitude, longitude)),
        }
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    fn permission(&self) -> PermissionState {
        self.permission
    }

    async fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn current_fix(&self, _accuracy: Accuracy, _timeout: Duration) -> Option<Location> {
        self.fix
    }
}

/// Serves a fixed snapshot, or fails every read when `snapshot` is `None`
///
/// With `hang` set every read blocks forever, like a wedged modem.
pub struct FakeCells {
    pub snapshot: Option<CellSnapshot>,
    pub level: CapabilityLevel,
    pub hang: bool,
}

impl FakeCells {
    pub fn lte() -> Self {
        let cell = LteCell {
            ci: Some(26_113_281),
            tac: Some(4_012),
            earfcn: Some(1_300),
            rsrp: Some(-95),
            rsrq: Some(-11),
            rssnr: Some(12),
        };
        Self {
            snapshot: Some(CellSnapshot {
                network_operator: Some("20404".to_string()),
                operator_name: Some("Vodafone NL".to_string()),
                ..CellSnapshot::with_registered(RadioCell::Lte(cell))
            }),
            level: CapabilityLevel::FULL,
            hang: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            snapshot: None,
            level: CapabilityLevel::FULL,
            hang: false,
        }
    }

    pub fn hung() -> Self {
        Self {
            hang: true,
            ..Self::lte()
        }
    }
}

#[async_trait]
impl CellInfoSource for FakeCells {
    async fn snapshot(&self) -> Result<CellSnapshot> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.snapshot
            .clone()
            .ok_or_else(|| anyhow!("modem not responding"))
    }

    fn capabilities(&self) -> CapabilityLevel {
        self.level
    }
}

/// Vec-backed store whose writes can be switched to fail or to panic once
#[derive(Default)]
pub struct MemoryStore {
    samples: Mutex<Vec<DriveSample>>,
    failing: AtomicBool,
    panic_next: AtomicBool,
}

impl MemoryStore {
    pub fn panic_on_next_insert(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn samples(&self) -> Vec<DriveSample> {
        self.samples.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        } else {
            Ok(())
        }
    }

    fn filtered(&self, keep: impl Fn(&DriveSample) -> bool) -> Vec<DriveSample> {
        let mut samples: Vec<DriveSample> =
            self.samples.lock().unwrap().iter().filter(|s| keep(s)).cloned().collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        samples
    }
}

impl SampleStore for MemoryStore {
    fn insert(&self, sample: &DriveSample) -> Result<i64, StoreError> {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("disk driver exploded");
        }
        self.check()?;
        let mut samples = self.samples.lock().unwrap();
        let id = samples.len() as i64 + 1;
        samples.push(sample.clone().with_id(id));
        Ok(id)
    }

    fn insert_batch(&self, batch: &[DriveSample]) -> Result<(), StoreError> {
        for sample in batch {
            self.insert(sample)?;
        }
        Ok(())
    }

    fn query_all(&self) -> Result<Vec<DriveSample>, StoreError> {
        Ok(self.filtered(|_| true))
    }

    fn query_by_time_range(&self, start: i64, end: i64) -> Result<Vec<DriveSample>, StoreError> {
        Ok(self.filtered(|s| (start..=end).contains(&s.timestamp)))
    }

    fn query_by_technology(&self, technology: &str) -> Result<Vec<DriveSample>, StoreError> {
        Ok(self.filtered(|s| s.cell.technology.label() == technology))
    }

    fn query_by_operator(&self, operator: &str) -> Result<Vec<DriveSample>, StoreError> {
        Ok(self.filtered(|s| s.cell.operator_name == operator))
    }

    fn distinct_technologies(&self) -> Result<Vec<String>, StoreError> {
        let set: HashSet<String> = self
            .filtered(|_| true)
            .iter()
            .map(|s| s.cell.technology.label().to_string())
            .collect();
        Ok(set.into_iter().collect())
    }

    fn distinct_operators(&self) -> Result<Vec<String>, StoreError> {
        let set: HashSet<String> = self
            .filtered(|_| true)
            .iter()
            .map(|s| s.cell.operator_name.clone())
            .collect();
        Ok(set.into_iter().collect())
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.len() as u64)
    }

    fn delete_older_than(&self, before: i64) -> Result<usize, StoreError> {
        let mut samples = self.samples.lock().unwrap();
        let len = samples.len();
        samples.retain(|s| s.timestamp >= before);
        Ok(len - samples.len())
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let mut samples = self.samples.lock().unwrap();
        let len = samples.len();
        samples.clear();
        Ok(len)
    }
}

/// Completes instantly with a fixed metric and the note "ok"
pub struct FixedProbe(pub ProbeKind, pub f64);

#[async_trait]
impl Probe for FixedProbe {
    fn kind(&self) -> ProbeKind {
        self.0
    }

    async fn run(&self, _target: &str) -> ProbeResult {
        ProbeResult::completed_with_note(self.1, "ok")
    }
}

pub fn probe_suite() -> NetworkProbeSuite {
    NetworkProbeSuite::new(Duration::from_secs(5))
        .with_probe(FixedProbe(ProbeKind::Upload, 250.0))
        .with_probe(FixedProbe(ProbeKind::Ping, 12.0))
        .with_probe(FixedProbe(ProbeKind::Dns, 3.0))
        .with_probe(FixedProbe(ProbeKind::Web, 80.0))
        .with_probe(FixedProbe(ProbeKind::Sms, 40.0))
}

pub fn targets() -> ProbeTargets {
    ProbeTargets {
        upload_url: "upload.test/in".to_string(),
        ping_host: "ping.test".to_string(),
        dns_host: "dns.test".to_string(),
        web_url: "web.test".to_string(),
        sms_number: "+15550100".to_string(),
    }
}

pub fn config(probes: &[ProbeKind]) -> SessionConfig {
    let probes: BTreeSet<ProbeKind> = probes.iter().copied().collect();
    SessionConfig::new(probes, targets())
}

pub fn collector(
    location: FakeLocation,
    cells: FakeCells,
    store: Arc<MemoryStore>,
) -> DriveTestCollector {
    DriveTestCollector::new(DEVICE_ID, Arc::new(location), Arc::new(cells), probe_suite(), store)
}
