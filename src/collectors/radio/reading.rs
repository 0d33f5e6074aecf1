//! Raw cell readings as delivered by a platform backend
//!
//! Every field is optional: `None` means the platform did not deliver it on
//! this read. Whether a field is even *allowed* to be read is decided by the
//! capability level, not by these types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GsmCell {
    pub cid: Option<i32>,
    pub lac: Option<i32>,
    pub arfcn: Option<i32>,
    /// Received signal level in dBm
    pub dbm: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcdmaCell {
    pub cid: Option<i32>,
    pub lac: Option<i32>,
    pub uarfcn: Option<i32>,
    /// RSCP in dBm
    pub rscp: Option<i32>,
    /// Ec/No in dB
    pub ec_no: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LteCell {
    pub ci: Option<i32>,
    pub tac: Option<i32>,
    pub earfcn: Option<i32>,
    pub rsrp: Option<i32>,
    pub rsrq: Option<i32>,
    pub rssnr: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NrCell {
    pub nci: Option<i64>,
    pub tac: Option<i32>,
    pub nrarfcn: Option<i32>,
    pub ss_rsrp: Option<i32>,
    pub ss_rsrq: Option<i32>,
    pub ss_sinr: Option<i32>,
}

/// One cell as seen by the modem, tagged by technology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RadioCell {
    Gsm(GsmCell),
    Wcdma(WcdmaCell),
    Lte(LteCell),
    Nr(NrCell),
    /// A technology the sampler does not decode (CDMA, TD-SCDMA, ...)
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedCell {
    pub registered: bool,
    pub cell: RadioCell,
}

/// Everything a backend knows about the radio at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// MCC+MNC of the registered network
    pub network_operator: Option<String>,
    pub operator_name: Option<String>,
    pub cells: Vec<ObservedCell>,
}

impl CellSnapshot {
    /// The serving cell; only the first registered cell is considered
    pub fn registered_cell(&self) -> Option<&RadioCell> {
        self.cells
            .iter()
            .find(|observed| observed.registered)
            .map(|observed| &observed.cell)
    }

    pub fn with_registered(cell: RadioCell) -> Self {
        Self {
            network_operator: None,
            operator_name: None,
            cells: vec![ObservedCell {
                registered: true,
                cell,
            }],
        }
    }
}
