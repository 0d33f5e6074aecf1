//! Registered-cell normalization
//!
//! Turns a raw [`CellSnapshot`] into a [`CellMeasurement`]. Nothing in here
//! fails: every missing permission, capability or field degrades to the
//! sentinel value plus a note, and the sample is still produced.

use log::{debug, trace};

use crate::collectors::platform::PermissionState;
use crate::collectors::radio::capability::{
    CapabilityLevel, CellField, FieldSupport, unsupported_note,
};
use crate::collectors::radio::frequency::{self, ChannelFamily};
use crate::collectors::radio::reading::{CellSnapshot, GsmCell, LteCell, NrCell, RadioCell, WcdmaCell};
use crate::models::{CellMeasurement, CellMeasurementBuilder, Technology, UNAVAILABLE};

/// Minimum length of an MCC+MNC string
const MIN_PLMN_LEN: usize = 5;

/// Normalizes the registered cell into a technology-tagged measurement
#[derive(Debug, Default)]
pub struct RadioSampler;

impl RadioSampler {
    pub fn new() -> Self {
        Self
    }

    /// Builds a measurement from `snapshot`
    ///
    /// `capability` is read once by the caller for this sample; `previous_notes`
    /// are kept in front of any notes this call adds.
    pub fn sample(
        &self,
        snapshot: Option<&CellSnapshot>,
        capability: CapabilityLevel,
        permission: PermissionState,
        previous_notes: &str,
    ) -> CellMeasurement {
        let mut builder = CellMeasurementBuilder::with_previous_notes(previous_notes);

        let Some(snapshot) = snapshot else {
            builder.note("Cell information unavailable");
            return builder.build();
        };

        builder.operator_name(
            snapshot
                .operator_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown"),
        );

        match snapshot.network_operator.as_deref() {
            Some(plmn) if plmn.len() >= MIN_PLMN_LEN => {
                builder.plmn_id(plmn);
            }
            _ => {
                builder.note("PLMN ID not available");
            }
        }

        if !permission.is_granted() {
            builder.note("Fine location permission required for detailed cell info");
            return builder.build();
        }

        match snapshot.registered_cell() {
            Some(RadioCell::Lte(cell)) => self.sample_lte(cell, capability, &mut builder),
            Some(RadioCell::Wcdma(cell)) => self.sample_wcdma(cell, capability, &mut builder),
            Some(RadioCell::Gsm(cell)) => self.sample_gsm(cell, capability, &mut builder),
            Some(RadioCell::Nr(cell)) => self.sample_nr(cell, capability, &mut builder),
            Some(RadioCell::Other(kind)) => {
                builder.note(format!("Unsupported cell type: {kind}"));
            }
            None => {
                builder.note("No registered cell found");
            }
        }

        let measurement = builder.build();
        debug!(
            "Sampled {} cell (cell_id={}, arfcn={}, capability={})",
            measurement.technology, measurement.cell_id, measurement.arfcn, capability
        );
        measurement
    }

    fn sample_lte(
        &self,
        cell: &LteCell,
        capability: CapabilityLevel,
        builder: &mut CellMeasurementBuilder,
    ) {
        builder.technology(Technology::Lte);

        if gate(capability, CellField::LteIdentity, builder) {
            match (reported(cell.ci), reported(cell.tac)) {
                (None, None) => {
                    builder.note("LTE cell identity not available");
                }
                (ci, tac) => {
                    if let Some(ci) = ci {
                        builder.cell_id(i64::from(ci));
                    }
                    if let Some(tac) = tac {
                        builder.tac(tac);
                    }
                }
            }
        }

        if gate(capability, CellField::LteChannel, builder) {
            apply_channel(ChannelFamily::Lte, reported(cell.earfcn), "EARFCN", builder);
        }

        let rsrp = reported(cell.rsrp);
        let rsrq = reported(cell.rsrq);
        let sinr = reported(cell.rssnr);
        if rsrp.is_none() && rsrq.is_none() && sinr.is_none() {
            builder.note("LTE signal strength not available");
        }
        if let Some(v) = rsrp {
            builder.rsrp(v);
        }
        if let Some(v) = rsrq {
            builder.rsrq(v);
        }
        if let Some(v) = sinr {
            builder.sinr(v);
        }
    }

    fn sample_wcdma(
        &self,
        cell: &WcdmaCell,
        capability: CapabilityLevel,
        builder: &mut CellMeasurementBuilder,
    ) {
        builder.technology(Technology::Wcdma);
        apply_legacy_identity(reported(cell.cid), reported(cell.lac), builder);

        if gate(capability, CellField::WcdmaChannel, builder) {
            apply_channel(ChannelFamily::Umts, reported(cell.uarfcn), "UARFCN", builder);
        }

        match reported(cell.rscp) {
            Some(rscp) => {
                builder.rscp(rscp);
            }
            None => {
                builder.note("RSCP not available");
            }
        }
        match reported(cell.ec_no) {
            Some(ec_no) => {
                builder.ec_no(ec_no);
            }
            None => {
                builder.note("EcNo not available");
            }
        }
    }

    fn sample_gsm(
        &self,
        cell: &GsmCell,
        capability: CapabilityLevel,
        builder: &mut CellMeasurementBuilder,
    ) {
        builder.technology(Technology::Gsm);
        apply_legacy_identity(reported(cell.cid), reported(cell.lac), builder);

        if gate(capability, CellField::GsmChannel, builder) {
            apply_channel(ChannelFamily::Gsm, reported(cell.arfcn), "ARFCN", builder);
        }

        match reported(cell.dbm) {
            Some(dbm) => {
                builder.rx_lev(dbm);
            }
            None => {
                builder.note("RxLev not available");
            }
        }
    }

    fn sample_nr(
        &self,
        cell: &NrCell,
        capability: CapabilityLevel,
        builder: &mut CellMeasurementBuilder,
    ) {
        builder.technology(Technology::Nr);

        if !gate(capability, CellField::NrCell, builder) {
            return;
        }

        if gate(capability, CellField::NrIdentity, builder) {
            match (cell.nci.filter(|nci| *nci >= 0), reported(cell.tac)) {
                (None, None) => {
                    builder.note("5G cell identifiers not available");
                }
                (nci, tac) => {
                    if let Some(nci) = nci {
                        builder.cell_id(nci);
                    }
                    if let Some(tac) = tac {
                        builder.tac(tac);
                    }
                }
            }
        }

        apply_channel(ChannelFamily::Nr, reported(cell.nrarfcn), "5G ARFCN", builder);

        if gate(capability, CellField::NrSignal, builder) {
            let rsrp = reported(cell.ss_rsrp);
            let rsrq = reported(cell.ss_rsrq);
            let sinr = reported(cell.ss_sinr);
            if rsrp.is_none() && rsrq.is_none() && sinr.is_none() {
                builder.note("5G signal strength not available");
            }
            if let Some(v) = rsrp {
                builder.rsrp(v);
            }
            if let Some(v) = rsrq {
                builder.rsrq(v);
            }
            if let Some(v) = sinr {
                builder.sinr(v);
            }
        }
    }
}

/// Checks a capability gate, recording a note when the field is not readable
fn gate(capability: CapabilityLevel, field: CellField, builder: &mut CellMeasurementBuilder) -> bool {
    match capability.supports(field) {
        FieldSupport::Supported => true,
        FieldSupport::Unsupported { required } => {
            trace!("Skipping {:?} at capability {}", field, capability);
            builder.note(unsupported_note(field, required));
            false
        }
    }
}

fn apply_channel(
    family: ChannelFamily,
    channel: Option<i32>,
    name: &str,
    builder: &mut CellMeasurementBuilder,
) {
    match channel.filter(|c| *c >= 0) {
        Some(channel) => {
            let info = frequency::lookup(family, channel);
            builder.channel(channel, info.band_label, info.frequency_label);
        }
        None => {
            builder.note(format!("{name} not available"));
        }
    }
}

fn apply_legacy_identity(cid: Option<i32>, lac: Option<i32>, builder: &mut CellMeasurementBuilder) {
    if cid.is_none() && lac.is_none() {
        builder.note("Cell identity not available");
        return;
    }
    if let Some(cid) = cid {
        builder.cell_id(i64::from(cid));
    }
    if let Some(lac) = lac {
        builder.lac(lac);
    }
}

/// Backends may report "no value" as the platform sentinel instead of `None`
fn reported(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != UNAVAILABLE)
}
