//! Platform capability levels for cell extraction
//!
//! Different platforms (and different revisions of the same platform) expose
//! different parts of the registered cell. Backends report one
//! [`CapabilityLevel`]; the sampler asks it once per sample whether a given
//! [`CellField`] can be read instead of comparing version numbers inline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered capability levels; each level includes everything below it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityLevel {
    /// Identifiers and signal strength for 2G/3G cells only
    Basic,
    /// Adds ARFCN / UARFCN / EARFCN channel numbers
    ChannelNumbers,
    /// Adds LTE cell identity (CI, TAC)
    CellIdentity,
    /// Adds NR cells and their NR-ARFCN
    NrCells,
    /// Adds NR identity and SS-RSRP/RSRQ/SINR measurements
    NrMeasurements,
}

impl CapabilityLevel {
    pub const FULL: CapabilityLevel = CapabilityLevel::NrMeasurements;

    /// Maps an Android-style API level onto a capability level
    pub fn from_api_level(api_level: u32) -> Self {
        match api_level {
            0..=23 => CapabilityLevel::Basic,
            24..=27 => CapabilityLevel::ChannelNumbers,
            28 => CapabilityLevel::CellIdentity,
            29 => CapabilityLevel::NrCells,
            _ => CapabilityLevel::NrMeasurements,
        }
    }

    pub fn supports(&self, field: CellField) -> FieldSupport {
        let required = field.required_level();
        if *self >= required {
            FieldSupport::Supported
        } else {
            FieldSupport::Unsupported { required }
        }
    }
}

impl fmt::Display for CapabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityLevel::Basic => "basic",
            CapabilityLevel::ChannelNumbers => "channel-numbers",
            CapabilityLevel::CellIdentity => "cell-identity",
            CapabilityLevel::NrCells => "nr-cells",
            CapabilityLevel::NrMeasurements => "nr-measurements",
        };
        f.write_str(name)
    }
}

/// Extraction steps that are gated on the capability level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellField {
    GsmChannel,
    WcdmaChannel,
    LteChannel,
    LteIdentity,
    NrCell,
    NrIdentity,
    NrSignal,
}

impl CellField {
    pub fn required_level(&self) -> CapabilityLevel {
        match self {
            CellField::GsmChannel | CellField::WcdmaChannel | CellField::LteChannel => {
                CapabilityLevel::ChannelNumbers
            }
            CellField::LteIdentity => CapabilityLevel::CellIdentity,
            CellField::NrCell => CapabilityLevel::NrCells,
            CellField::NrIdentity | CellField::NrSignal => CapabilityLevel::NrMeasurements,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CellField::GsmChannel => "ARFCN",
            CellField::WcdmaChannel => "UARFCN",
            CellField::LteChannel => "EARFCN",
            CellField::LteIdentity => "LTE TAC and CI",
            CellField::NrCell => "5G cell analysis",
            CellField::NrIdentity => "5G cell identifiers",
            CellField::NrSignal => "5G signal measurements",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSupport {
    Supported,
    Unsupported { required: CapabilityLevel },
}

impl FieldSupport {
    pub fn is_supported(&self) -> bool {
        matches!(self, FieldSupport::Supported)
    }
}

/// Note recorded when a field is skipped because of the capability level
pub fn unsupported_note(field: CellField, required: CapabilityLevel) -> String {
    format!("{} requires capability level {}", field.description(), required)
}
