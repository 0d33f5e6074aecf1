//! Channel number to band and frequency mapping
//!
//! Every radio family has one table of downlink channel ranges. A range maps
//! its channels linearly: `freq = base_mhz + step_mhz * (channel - first)`.
//! Ranges inside a table are sorted by `first` and never overlap, so a channel
//! matches at most one range and both labels always come from that range.
//!
//! Values follow the 3GPP downlink rasters (TS 45.005, TS 25.101, TS 36.101
//! and TS 38.104). Adding a band means adding a row; call sites never change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel numbering family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelFamily {
    /// GSM ARFCN
    Gsm,
    /// UMTS UARFCN
    Umts,
    /// LTE EARFCN
    Lte,
    /// 5G NR-ARFCN
    Nr,
}

impl ChannelFamily {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelFamily::Gsm => "GSM",
            ChannelFamily::Umts => "UMTS",
            ChannelFamily::Lte => "LTE",
            ChannelFamily::Nr => "5G",
        }
    }

    pub fn table(&self) -> &'static BandTable {
        match self {
            ChannelFamily::Gsm => &GSM_TABLE,
            ChannelFamily::Umts => &UMTS_TABLE,
            ChannelFamily::Lte => &LTE_TABLE,
            ChannelFamily::Nr => &NR_TABLE,
        }
    }
}

impl fmt::Display for ChannelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A contiguous block of channels belonging to one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRange {
    pub first: i32,
    pub last: i32,
    pub base_mhz: f64,
    pub step_mhz: f64,
    /// Short band name, e.g. "Band 3" or "n78"
    pub band: &'static str,
    /// Nominal band frequency used in the band label, e.g. "1800 MHz"
    pub nominal: &'static str,
}

impl BandRange {
    pub fn contains(&self, channel: i32) -> bool {
        (self.first..=self.last).contains(&channel)
    }

    pub fn frequency_mhz(&self, channel: i32) -> f64 {
        self.base_mhz + self.step_mhz * f64::from(channel - self.first)
    }

    pub fn band_label(&self) -> String {
        format!("{} ({})", self.band, self.nominal)
    }
}

/// All known ranges for one channel family
#[derive(Debug)]
pub struct BandTable {
    pub family: ChannelFamily,
    /// Decimal places used when printing frequencies of this family
    pub precision: usize,
    pub ranges: &'static [BandRange],
}

impl BandTable {
    pub fn find(&self, channel: i32) -> Option<&'static BandRange> {
        // Sorted and disjoint: the candidate is the last range starting at or before `channel`.
        let idx = self.ranges.partition_point(|range| range.first <= channel);
        let candidate = self.ranges.get(idx.checked_sub(1)?)?;
        candidate.contains(channel).then_some(candidate)
    }
}

/// Result of resolving a channel number
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub channel: i32,
    pub frequency_mhz: Option<f64>,
    pub frequency_label: String,
    pub band_label: String,
    pub range: Option<&'static BandRange>,
}

impl ChannelInfo {
    pub fn is_known(&self) -> bool {
        self.range.is_some()
    }
}

/// Resolves a channel number of the given family into frequency and band labels
///
/// Unknown channels are not an error: both labels then say "Unknown band".
pub fn lookup(family: ChannelFamily, channel: i32) -> ChannelInfo {
    let table = family.table();
    match table.find(channel) {
        Some(range) => {
            let mhz = range.frequency_mhz(channel);
            ChannelInfo {
                channel,
                frequency_mhz: Some(mhz),
                frequency_label: format!(
                    "{:.prec$} MHz ({})",
                    mhz,
                    range.band,
                    prec = table.precision
                ),
                band_label: range.band_label(),
                range: Some(range),
            }
        }
        None => ChannelInfo {
            channel,
            frequency_mhz: None,
            frequency_label: format!("{channel} (Unknown band)"),
            band_label: format!("Unknown band ({family})"),
            range: None,
        },
    }
}

pub fn frequency_label(family: ChannelFamily, channel: i32) -> String {
    lookup(family, channel).frequency_label
}

pub fn band_label(family: ChannelFamily, channel: i32) -> String {
    lookup(family, channel).band_label
}

const fn range(
    first: i32,
    last: i32,
    base_mhz: f64,
    step_mhz: f64,
    band: &'static str,
    nominal: &'static str,
) -> BandRange {
    BandRange {
        first,
        last,
        base_mhz,
        step_mhz,
        band,
        nominal,
    }
}

pub static GSM_TABLE: BandTable = BandTable {
    family: ChannelFamily::Gsm,
    precision: 1,
    ranges: &[
        range(0, 124, 935.0, 0.2, "GSM900", "900 MHz"),
        range(128, 251, 869.2, 0.2, "GSM850", "850 MHz"),
        range(512, 885, 1805.2, 0.2, "DCS1800", "1800 MHz"),
        range(975, 1023, 925.2, 0.2, "E-GSM900", "900 MHz"),
    ],
};

pub static UMTS_TABLE: BandTable = BandTable {
    family: ChannelFamily::Umts,
    precision: 1,
    ranges: &[
        range(1162, 1513, 1807.4, 0.2, "Band III", "1800 MHz"),
        range(2937, 3088, 927.4, 0.2, "Band VIII", "900 MHz"),
        range(4357, 4458, 871.4, 0.2, "Band V", "850 MHz"),
        range(9662, 9938, 1932.4, 0.2, "Band II", "1900 MHz"),
        range(10562, 10838, 2112.4, 0.2, "Band I", "2100 MHz"),
    ],
};

pub static LTE_TABLE: BandTable = BandTable {
    family: ChannelFamily::Lte,
    precision: 1,
    ranges: &[
        range(0, 599, 2110.0, 0.1, "Band 1", "2100 MHz"),
        range(600, 1199, 1930.0, 0.1, "Band 2", "1900 MHz"),
        range(1200, 1949, 1805.0, 0.1, "Band 3", "1800 MHz"),
        range(1950, 2399, 2110.0, 0.1, "Band 4", "1700/2100 MHz"),
        range(2400, 2649, 869.0, 0.1, "Band 5", "850 MHz"),
        range(2750, 3449, 2620.0, 0.1, "Band 7", "2600 MHz"),
        range(3450, 3799, 925.0, 0.1, "Band 8", "900 MHz"),
        range(6150, 6449, 791.0, 0.1, "Band 20", "800 MHz"),
        range(9210, 9659, 758.0, 0.1, "Band 28", "700 MHz"),
        range(37750, 38249, 2570.0, 0.1, "Band 38", "2600 MHz"),
        range(38650, 39649, 2300.0, 0.1, "Band 40", "2300 MHz"),
        range(39650, 41589, 2496.0, 0.1, "Band 41", "2500 MHz"),
    ],
};

pub static NR_TABLE: BandTable = BandTable {
    family: ChannelFamily::Nr,
    precision: 3,
    ranges: &[
        range(151600, 160600, 758.0, 0.005, "n28", "700 MHz"),
        range(185000, 192000, 925.0, 0.005, "n8", "900 MHz"),
        range(361000, 376000, 1805.0, 0.005, "n3", "1800 MHz"),
        range(386000, 398000, 1930.0, 0.005, "n2", "1900 MHz"),
        range(422000, 434000, 2110.0, 0.005, "n1", "2100 MHz"),
        range(524000, 538000, 2620.0, 0.005, "n7", "2600 MHz"),
        range(620000, 653333, 3300.0, 0.015, "n78", "3500 MHz"),
    ],
};
