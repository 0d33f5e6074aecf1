use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for signal fields the platform did not report.
///
/// Valid RSRP/RSCP/RxLev readings are negative dBm values and valid RSRQ,
/// SINR and EcNo readings are small signed dB values, so `i32::MAX` never
/// collides with a real measurement. Zero is a valid reading and is never
/// used as "unknown".
pub const UNAVAILABLE: i32 = i32::MAX;

/// Sentinel for identifier and channel fields the platform did not report.
pub const UNKNOWN_ID: i32 = -1;

/// Radio access technology of the registered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technology {
    Gsm,
    Wcdma,
    Lte,
    Nr,
    Unknown,
}

impl Technology {
    pub fn label(&self) -> &'static str {
        match self {
            Technology::Gsm => "GSM",
            Technology::Wcdma => "WCDMA",
            Technology::Lte => "LTE",
            Technology::Nr => "NR",
            Technology::Unknown => "Unknown",
        }
    }

    /// Parses a stored label back into a technology. Anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "GSM" => Technology::Gsm,
            "WCDMA" | "UMTS" => Technology::Wcdma,
            "LTE" => Technology::Lte,
            "NR" | "5G" => Technology::Nr,
            _ => Technology::Unknown,
        }
    }

    /// The signal-quality group this technology reports into
    pub fn signal_group(&self) -> Option<SignalGroup> {
        match self {
            Technology::Lte | Technology::Nr => Some(SignalGroup::ReferenceSignal),
            Technology::Wcdma => Some(SignalGroup::Wcdma),
            Technology::Gsm => Some(SignalGroup::Gsm),
            Technology::Unknown => None,
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Technology-specific groups of signal-quality fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalGroup {
    /// RSRP / RSRQ / SINR, reported by LTE and NR cells
    ReferenceSignal,
    /// RSCP / EcNo
    Wcdma,
    /// RxLev
    Gsm,
}

/// Normalized measurement of the currently registered cell
///
/// Built once per sample through [`CellMeasurementBuilder`]; the finished
/// value is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMeasurement {
    pub technology: Technology,
    /// MCC+MNC of the serving network, empty when unknown
    pub plmn_id: String,
    pub operator_name: String,
    pub cell_id: i64,
    pub lac: i32,
    pub rac: i32,
    pub tac: i32,
    /// ARFCN, UARFCN, EARFCN or NR-ARFCN depending on the technology
    pub arfcn: i32,
    pub frequency_band: String,
    pub actual_frequency: String,
    pub rsrp: i32,
    pub rsrq: i32,
    pub sinr: i32,
    pub rscp: i32,
    pub ec_no: i32,
    pub rx_lev: i32,
    pub notes: String,
}

impl CellMeasurement {
    /// Signal groups holding at least one reported value
    pub fn populated_signal_groups(&self) -> Vec<SignalGroup> {
        let mut groups = Vec::new();
        if [self.rsrp, self.rsrq, self.sinr].iter().any(|v| *v != UNAVAILABLE) {
            groups.push(SignalGroup::ReferenceSignal);
        }
        if [self.rscp, self.ec_no].iter().any(|v| *v != UNAVAILABLE) {
            groups.push(SignalGroup::Wcdma);
        }
        if self.rx_lev != UNAVAILABLE {
            groups.push(SignalGroup::Gsm);
        }
        groups
    }

    pub fn has_cell_id(&self) -> bool {
        self.cell_id != UNKNOWN_ID as i64
    }

    pub fn has_arfcn(&self) -> bool {
        self.arfcn != UNKNOWN_ID
    }
}

impl Default for CellMeasurement {
    fn default() -> Self {
        Self {
            technology: Technology::Unknown,
            plmn_id: String::new(),
            operator_name: "Unknown".to_string(),
            cell_id: UNKNOWN_ID as i64,
            lac: UNKNOWN_ID,
            rac: UNKNOWN_ID,
            tac: UNKNOWN_ID,
            arfcn: UNKNOWN_ID,
            frequency_band: "Unknown".to_string(),
            actual_frequency: "Unknown".to_string(),
            rsrp: UNAVAILABLE,
            rsrq: UNAVAILABLE,
            sinr: UNAVAILABLE,
            rscp: UNAVAILABLE,
            ec_no: UNAVAILABLE,
            rx_lev: UNAVAILABLE,
            notes: String::new(),
        }
    }
}

/// Accumulates a [`CellMeasurement`] across extraction steps
///
/// Each step either fills fields or records a note explaining why it could
/// not; notes are appended in order and never overwritten.
#[derive(Debug, Clone, Default)]
pub struct CellMeasurementBuilder {
    measurement: CellMeasurement,
    notes: Vec<String>,
}

impl CellMeasurementBuilder {
    /// Starts a builder that keeps notes already gathered earlier in the tick
    pub fn with_previous_notes(previous_notes: &str) -> Self {
        let notes = previous_notes
            .split("; ")
            .filter(|note| !note.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self {
            measurement: CellMeasurement::default(),
            notes,
        }
    }

    pub fn technology(&mut self, technology: Technology) -> &mut Self {
        self.measurement.technology = technology;
        self
    }

    pub fn plmn_id(&mut self, plmn_id: impl Into<String>) -> &mut Self {
        self.measurement.plmn_id = plmn_id.into();
        self
    }

    pub fn operator_name(&mut self, operator_name: impl Into<String>) -> &mut Self {
        self.measurement.operator_name = operator_name.into();
        self
    }

    pub fn cell_id(&mut self, cell_id: i64) -> &mut Self {
        self.measurement.cell_id = cell_id;
        self
    }

    pub fn lac(&mut self, lac: i32) -> &mut Self {
        self.measurement.lac = lac;
        self
    }

    pub fn tac(&mut self, tac: i32) -> &mut Self {
        self.measurement.tac = tac;
        self
    }

    /// Records the channel number together with the labels derived from it
    pub fn channel(
        &mut self,
        arfcn: i32,
        frequency_band: impl Into<String>,
        actual_frequency: impl Into<String>,
    ) -> &mut Self {
        self.measurement.arfcn = arfcn;
        self.measurement.frequency_band = frequency_band.into();
        self.measurement.actual_frequency = actual_frequency.into();
        self
    }

    pub fn rsrp(&mut self, rsrp: i32) -> &mut Self {
        self.measurement.rsrp = rsrp;
        self
    }

    pub fn rsrq(&mut self, rsrq: i32) -> &mut Self {
        self.measurement.rsrq = rsrq;
        self
    }

    pub fn sinr(&mut self, sinr: i32) -> &mut Self {
        self.measurement.sinr = sinr;
        self
    }

    pub fn rscp(&mut self, rscp: i32) -> &mut Self {
        self.measurement.rscp = rscp;
        self
    }

    pub fn ec_no(&mut self, ec_no: i32) -> &mut Self {
        self.measurement.ec_no = ec_no;
        self
    }

    pub fn rx_lev(&mut self, rx_lev: i32) -> &mut Self {
        self.measurement.rx_lev = rx_lev;
        self
    }

    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.notes.push(note.into());
        self
    }

    pub fn build(mut self) -> CellMeasurement {
        self.measurement.notes = self.notes.join("; ");
        self.measurement
    }
}
