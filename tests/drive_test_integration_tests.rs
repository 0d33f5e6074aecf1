use anyhow::Result;
use async_trait::async_trait;
use polaris_drive::collectors::drive_test::{CollectorError, CollectorEvent, SessionConfig};
use polaris_drive::collectors::platform::{CellInfoSource, StaticLocation};
use polaris_drive::collectors::probes::{DnsProbe, NetworkProbeSuite, PingProbe};
use polaris_drive::collectors::radio::{CapabilityLevel, CellSnapshot, LteCell, RadioCell};
use polaris_drive::collectors::DriveTestCollector;
use polaris_drive::models::{METRIC_UNKNOWN, ProbeKind, ProbeTargets, Technology};
use polaris_drive::storage::{SampleStore, SqliteSampleStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

/// End-to-end drive test: static location, a fixed LTE cell, real TCP and
/// DNS probes against the loopback interface and a file-backed store

struct FixedLteCell;

#[async_trait]
impl CellInfoSource for FixedLteCell {
    async fn snapshot(&self) -> Result<CellSnapshot> {
        Ok(CellSnapshot {
            network_operator: Some("26201".to_string()),
            operator_name: Some("Telekom.de".to_string()),
            ..CellSnapshot::with_registered(RadioCell::Lte(LteCell {
                ci: Some(17_039_617),
                tac: Some(40_421),
                earfcn: Some(6_300),
                rsrp: Some(-101),
                rsrq: Some(-9),
                rssnr: Some(7),
            }))
        })
    }

    fn capabilities(&self) -> CapabilityLevel {
        CapabilityLevel::FULL
    }
}

async fn wait_for_sample(
    events: &mut tokio::sync::broadcast::Receiver<CollectorEvent>,
) -> Option<u64> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(CollectorEvent::SampleCollected { sample_number, .. }) => {
                    return Some(sample_number);
                }
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), wait)
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn test_collect_store_and_stop() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteSampleStore::open(dir.path().join("drive.db")).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let probes = NetworkProbeSuite::new(Duration::from_secs(5))
        .with_probe(PingProbe::with_port(port))
        .with_probe(DnsProbe::new());
    let collector = DriveTestCollector::new(
        "integration-device",
        Arc::new(StaticLocation::new(52.5200, 13.4050)),
        Arc::new(FixedLteCell),
        probes,
        store.clone(),
    );

    let targets = ProbeTargets {
        ping_host: "127.0.0.1".to_string(),
        dns_host: "127.0.0.1".to_string(),
        ..ProbeTargets::default()
    };
    let selected: BTreeSet<ProbeKind> = [ProbeKind::Ping, ProbeKind::Dns].into_iter().collect();
    let config = SessionConfig::new(selected, targets).with_interval(Duration::from_secs(1));

    let mut events = collector.subscribe();
    assert_ok!(collector.start(config.clone()).await);
    assert!(matches!(
        collector.start(config).await,
        Err(CollectorError::AlreadyActive)
    ));

    assert_eq!(wait_for_sample(&mut events).await, Some(1));
    let total = assert_ok!(collector.stop().await);
    assert!(total >= 1);
    assert!(!collector.is_active());
    assert_err!(collector.stop().await);

    let stored = store.query_all().unwrap();
    assert_eq!(stored.len() as u64, total);

    let latest = &stored[0];
    assert_eq!(latest.device_id, "integration-device");
    assert_eq!(latest.cell.technology, Technology::Lte);
    assert_eq!(latest.cell.operator_name, "Telekom.de");
    assert_eq!(latest.cell.frequency_band, "Band 20 (800 MHz)");
    assert_eq!(latest.cell.rsrp, -101);
    assert!(latest.ping_response_time >= 0.0);
    assert!(latest.dns_response_time >= 0.0);
    assert_eq!(latest.http_upload_rate, METRIC_UNKNOWN);
    assert_eq!(latest.web_response_time, METRIC_UNKNOWN);
    assert_eq!(latest.sms_enqueue_ms, METRIC_UNKNOWN);
    assert!(latest.test_notes.contains("DNS: DNS resolution successful (1 addresses)"));
    assert_eq!((latest.latitude, latest.longitude), (52.5200, 13.4050));

    let status = collector.status();
    assert!(!status.active);
    assert_eq!(status.message, format!("Drive test stopped. {total} samples collected"));
}
