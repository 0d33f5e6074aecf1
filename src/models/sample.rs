use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

use super::cell::{CellMeasurement, Technology, UNAVAILABLE};
use super::probe::{ProbeKind, ProbeResult};

/// Metric value stored for probes that were not selected or did not complete
pub const METRIC_UNKNOWN: f64 = -1.0;

/// A single WGS84 position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the provider reports it
    pub accuracy_m: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
        }
    }
}

/// The persisted unit of a drive test: one location, one cell measurement and
/// one metric per probe kind, captured in a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveSample {
    /// Row id assigned by the store, `None` until persisted
    pub id: Option<i64>,
    pub device_id: String,
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub cell: CellMeasurement,
    /// Upload throughput in KB/s
    pub http_upload_rate: f64,
    pub ping_response_time: f64,
    pub dns_response_time: f64,
    pub web_response_time: f64,
    /// Time for the SMS to be accepted into the send queue, not delivery time
    pub sms_enqueue_ms: f64,
    pub test_notes: String,
}

impl DriveSample {
    /// Merges one tick's location, cell measurement and probe results
    pub fn merge(
        device_id: impl Into<String>,
        timestamp: i64,
        location: Location,
        cell: CellMeasurement,
        probes: &BTreeMap<ProbeKind, ProbeResult>,
        test_notes: impl Into<String>,
    ) -> Self {
        let metric = |kind: ProbeKind| {
            probes
                .get(&kind)
                .and_then(|result| result.metric)
                .unwrap_or(METRIC_UNKNOWN)
        };

        Self {
            id: None,
            device_id: device_id.into(),
            timestamp,
            latitude: location.latitude,
            longitude: location.longitude,
            cell,
            http_upload_rate: metric(ProbeKind::Upload),
            ping_response_time: metric(ProbeKind::Ping),
            dns_response_time: metric(ProbeKind::Dns),
            web_response_time: metric(ProbeKind::Web),
            sms_enqueue_ms: metric(ProbeKind::Sms),
            test_notes: test_notes.into(),
        }
    }

    /// Returns the same sample carrying the id the store assigned to it
    pub fn with_id(self, id: i64) -> Self {
        Self { id: Some(id), ..self }
    }

    pub fn metric(&self, kind: ProbeKind) -> f64 {
        match kind {
            ProbeKind::Upload => self.http_upload_rate,
            ProbeKind::Ping => self.ping_response_time,
            ProbeKind::Dns => self.dns_response_time,
            ProbeKind::Web => self.web_response_time,
            ProbeKind::Sms => self.sms_enqueue_ms,
        }
    }

    pub fn captured_at(&self) -> Option<DateTime<Local>> {
        Local.timestamp_millis_opt(self.timestamp).single()
    }

    /// Human-readable capture time, `yyyy-MM-dd HH:mm:ss` in local time
    pub fn timestamp_formatted(&self) -> String {
        self.captured_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }

    /// Multi-line preview published to observers after each tick
    pub fn preview(&self, sample_number: u64) -> String {
        let cell = &self.cell;
        let mut out = String::new();

        let _ = writeln!(out, "{} - {}", cell.technology, cell.operator_name);
        let _ = writeln!(out, "{:.6}, {:.6}", self.latitude, self.longitude);
        if cell.has_cell_id() {
            let _ = writeln!(out, "Cell ID: {}", cell.cell_id);
        }
        if cell.has_arfcn() {
            let _ = writeln!(out, "ARFCN: {}", cell.arfcn);
            let _ = writeln!(out, "{}", cell.actual_frequency);
        }

        match cell.technology {
            Technology::Lte | Technology::Nr => {
                if cell.rsrp != UNAVAILABLE {
                    let _ = writeln!(out, "RSRP: {} dBm", cell.rsrp);
                }
                if cell.rsrq != UNAVAILABLE {
                    let _ = writeln!(out, "RSRQ: {} dB", cell.rsrq);
                }
            }
            Technology::Wcdma => {
                if cell.rscp != UNAVAILABLE {
                    let _ = writeln!(out, "RSCP: {} dBm", cell.rscp);
                }
            }
            Technology::Gsm => {
                if cell.rx_lev != UNAVAILABLE {
                    let _ = writeln!(out, "RxLev: {} dBm", cell.rx_lev);
                }
            }
            Technology::Unknown => {}
        }

        for kind in ProbeKind::ALL {
            let value = self.metric(kind);
            if value > 0.0 {
                match kind {
                    ProbeKind::Upload => {
                        let _ = writeln!(out, "{}: {:.2} KB/s", kind, value);
                    }
                    _ => {
                        let _ = writeln!(out, "{}: {:.1} ms", kind, value);
                    }
                }
            }
        }

        let _ = write!(out, "Sample #{sample_number}");
        out
    }
}
