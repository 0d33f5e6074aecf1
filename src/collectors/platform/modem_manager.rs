//! ModemManager backend
//!
//! Reads the serving cell, GPS fixes and SMS submission through `mmcli`'s JSON
//! output. mmcli does not expose channel numbers, so samples taken through this
//! backend carry a note instead of ARFCN-derived labels.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::command::{de_string_opt, de_string_to_f64_opt, parse_hex, run_cmd};
use super::{Accuracy, CellInfoSource, LocationProvider, PermissionState, SmsError, SmsSender};
use crate::collectors::radio::{
    CapabilityLevel, CellSnapshot, GsmCell, LteCell, NrCell, ObservedCell, RadioCell, WcdmaCell,
};
use crate::models::Location;

const GPS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Output of `mmcli -m <id> --output-json`
#[derive(Debug, Deserialize)]
pub struct MmcliModemRoot {
    pub modem: MmcliModem,
}

#[derive(Debug, Deserialize)]
pub struct MmcliModem {
    pub generic: MmcliGeneric,
    #[serde(rename = "3gpp")]
    pub gpp: Option<Mmcli3gpp>,
}

#[derive(Debug, Deserialize)]
pub struct MmcliGeneric {
    #[serde(rename = "access-technologies", default)]
    pub access_technologies: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Mmcli3gpp {
    #[serde(rename = "operator-code", default, deserialize_with = "de_string_opt")]
    pub operator_code: Option<String>,
    #[serde(rename = "operator-name", default, deserialize_with = "de_string_opt")]
    pub operator_name: Option<String>,
}

/// Output of `mmcli -m <id> --signal-get --output-json`
#[derive(Debug, Deserialize)]
pub struct MmcliSignalRoot {
    pub modem: MmcliSignalModem,
}

#[derive(Debug, Deserialize)]
pub struct MmcliSignalModem {
    pub signal: MmcliSignalData,
}

#[derive(Debug, Default, Deserialize)]
pub struct MmcliSignalData {
    pub gsm: Option<GsmSignal>,
    pub umts: Option<UmtsSignal>,
    pub lte: Option<LteSignal>,
    #[serde(rename = "5g")]
    pub nr: Option<LteSignal>,
}

#[derive(Debug, Deserialize)]
pub struct GsmSignal {
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub rssi: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UmtsSignal {
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub rscp: Option<f64>,
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub ecio: Option<f64>,
}

/// Reference-signal block, shared by the "lte" and "5g" sections
#[derive(Debug, Deserialize)]
pub struct LteSignal {
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub rsrp: Option<f64>,
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub rsrq: Option<f64>,
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub snr: Option<f64>,
}

/// Output of `mmcli -m <id> --location-get --output-json`
#[derive(Debug, Deserialize)]
pub struct MmcliLocationRoot {
    pub modem: MmcliLocationModem,
}

#[derive(Debug, Deserialize)]
pub struct MmcliLocationModem {
    pub location: MmcliLocationData,
}

#[derive(Debug, Default, Deserialize)]
pub struct MmcliLocationData {
    #[serde(rename = "3gpp")]
    pub gpp: Option<GppLocation>,
    pub gps: Option<GpsLocation>,
}

/// Serving cell identity; identifiers are hexadecimal strings
#[derive(Debug, Deserialize)]
pub struct GppLocation {
    #[serde(default, deserialize_with = "de_string_opt")]
    pub cid: Option<String>,
    #[serde(default, deserialize_with = "de_string_opt")]
    pub lac: Option<String>,
    #[serde(default, deserialize_with = "de_string_opt")]
    pub mcc: Option<String>,
    #[serde(default, deserialize_with = "de_string_opt")]
    pub mnc: Option<String>,
    #[serde(default, deserialize_with = "de_string_opt")]
    pub tac: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GpsLocation {
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de_string_to_f64_opt")]
    pub longitude: Option<f64>,
}

/// Output of `mmcli -m <id> --location-status --output-json`
#[derive(Debug, Deserialize)]
pub struct MmcliLocationStatusRoot {
    pub modem: MmcliLocationStatusModem,
}

#[derive(Debug, Deserialize)]
pub struct MmcliLocationStatusModem {
    pub location: MmcliLocationStatus,
}

#[derive(Debug, Deserialize)]
pub struct MmcliLocationStatus {
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl MmcliLocationStatus {
    pub fn gps_enabled(&self) -> bool {
        self.enabled.iter().any(|source| source.starts_with("gps"))
    }
}

impl GpsLocation {
    pub fn fix(&self) -> Option<Location> {
        Some(Location::new(self.latitude?, self.longitude?))
    }
}

fn dbm(value: Option<f64>) -> Option<i32> {
    value.map(|v| v.round() as i32)
}

fn hex_i32(value: Option<&str>) -> Option<i32> {
    parse_hex(value).and_then(|v| i32::try_from(v).ok())
}

/// Maps one mmcli access technology onto the cell it describes
fn serving_cell(
    access_technology: &str,
    signal: &MmcliSignalData,
    gpp: Option<&GppLocation>,
) -> RadioCell {
    let cid = gpp.and_then(|g| g.cid.as_deref());
    let lac = gpp.and_then(|g| hex_i32(g.lac.as_deref()));
    let tac = gpp.and_then(|g| hex_i32(g.tac.as_deref()));

    match access_technology {
        "lte" | "lte-cat-m" | "lte-nb-iot" => {
            let s = signal.lte.as_ref();
            RadioCell::Lte(LteCell {
                ci: hex_i32(cid),
                tac,
                earfcn: None,
                rsrp: dbm(s.and_then(|s| s.rsrp)),
                rsrq: dbm(s.and_then(|s| s.rsrq)),
                rssnr: dbm(s.and_then(|s| s.snr)),
            })
        }
        "5gnr" => {
            let s = signal.nr.as_ref();
            RadioCell::Nr(NrCell {
                nci: parse_hex(cid),
                tac,
                nrarfcn: None,
                ss_rsrp: dbm(s.and_then(|s| s.rsrp)),
                ss_rsrq: dbm(s.and_then(|s| s.rsrq)),
                ss_sinr: dbm(s.and_then(|s| s.snr)),
            })
        }
        "umts" | "hsdpa" | "hsupa" | "hspa" | "hspa-plus" => {
            let s = signal.umts.as_ref();
            RadioCell::Wcdma(WcdmaCell {
                cid: hex_i32(cid),
                lac,
                uarfcn: None,
                rscp: dbm(s.and_then(|s| s.rscp)),
                ec_no: dbm(s.and_then(|s| s.ecio)),
            })
        }
        "gsm" | "gsm-compact" | "gprs" | "edge" => RadioCell::Gsm(GsmCell {
            cid: hex_i32(cid),
            lac,
            arfcn: None,
            dbm: dbm(signal.gsm.as_ref().and_then(|s| s.rssi)),
        }),
        other => RadioCell::Other(other.to_string()),
    }
}

/// Assembles a snapshot from the three mmcli reads; signal and location are optional
pub fn build_snapshot(
    modem: &MmcliModemRoot,
    signal: Option<&MmcliSignalData>,
    location: Option<&MmcliLocationData>,
) -> CellSnapshot {
    let gpp = location.and_then(|l| l.gpp.as_ref());
    let empty_signal = MmcliSignalData::default();
    let signal = signal.unwrap_or(&empty_signal);

    let network_operator = modem
        .modem
        .gpp
        .as_ref()
        .and_then(|g| g.operator_code.clone())
        .or_else(|| {
            let g = gpp?;
            Some(format!("{}{}", g.mcc.as_deref()?, g.mnc.as_deref()?))
        });
    let operator_name = modem.modem.gpp.as_ref().and_then(|g| g.operator_name.clone());

    // The most capable technology is listed first; that is the serving cell.
    let cells = modem
        .modem
        .generic
        .access_technologies
        .first()
        .map(|tech| ObservedCell {
            registered: true,
            cell: serving_cell(tech, signal, gpp),
        })
        .into_iter()
        .collect();

    CellSnapshot {
        network_operator,
        operator_name,
        cells,
    }
}

/// Extracts the object number from mmcli's "Successfully created new SMS: /org/.../SMS/3"
pub fn parse_created_sms(output: &str) -> Option<String> {
    let path = output.lines().find(|line| line.contains("/SMS/"))?.trim();
    let id = path.rsplit('/').next()?.trim();
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

pub struct ModemManager {
    modem_id: String,
    capability: CapabilityLevel,
    sms_enabled: bool,
}

impl ModemManager {
    pub fn new(modem_id: impl Into<String>, capability: CapabilityLevel) -> Self {
        Self {
            modem_id: modem_id.into(),
            capability,
            sms_enabled: false,
        }
    }

    pub fn with_sms(mut self, enabled: bool) -> Self {
        self.sms_enabled = enabled;
        self
    }

    /// Picks the first modem listed by `mmcli -L`
    pub async fn discover(capability: CapabilityLevel) -> Result<Self> {
        let output = run_cmd("mmcli", &["-L"]).await?;
        let modem_id = output
            .split_whitespace()
            .find(|token| token.contains("/Modem/"))
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("No modem listed by mmcli"))?;

        debug!("Discovered modem {}", modem_id);
        Ok(Self::new(modem_id, capability))
    }

    pub fn modem_id(&self) -> &str {
        &self.modem_id
    }

    async fn mmcli_json<T: DeserializeOwned>(&self, extra: &[&str]) -> Result<T> {
        let mut args = vec!["-m", self.modem_id.as_str()];
        args.extend_from_slice(extra);
        args.push("--output-json");
        let output = run_cmd("mmcli", &args).await?;
        serde_json::from_str(&output)
            .with_context(|| format!("Failed to parse mmcli {} output", extra.join(" ")))
    }

    async fn location(&self) -> Result<MmcliLocationData> {
        let root: MmcliLocationRoot = self.mmcli_json(&["--location-get"]).await?;
        Ok(root.modem.location)
    }
}

#[async_trait]
impl CellInfoSource for ModemManager {
    async fn snapshot(&self) -> Result<CellSnapshot> {
        let modem: MmcliModemRoot = self
            .mmcli_json(&[])
            .await
            .context("Failed to read modem status")?;

        let signal = match self.mmcli_json::<MmcliSignalRoot>(&["--signal-get"]).await {
            Ok(root) => Some(root.modem.signal),
            Err(e) => {
                warn!("Signal read failed on modem {}: {}", self.modem_id, e);
                None
            }
        };
        let location = match self.location().await {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("3GPP location read failed on modem {}: {}", self.modem_id, e);
                None
            }
        };

        Ok(build_snapshot(&modem, signal.as_ref(), location.as_ref()))
    }

    fn capabilities(&self) -> CapabilityLevel {
        self.capability
    }
}

#[async_trait]
impl LocationProvider for ModemManager {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn is_enabled(&self) -> bool {
        match self
            .mmcli_json::<MmcliLocationStatusRoot>(&["--location-status"])
            .await
        {
            Ok(root) => root.modem.location.gps_enabled(),
            Err(e) => {
                warn!("Location status read failed on modem {}: {}", self.modem_id, e);
                false
            }
        }
    }

    async fn current_fix(&self, _accuracy: Accuracy, timeout: Duration) -> Option<Location> {
        // The modem GPS has a single accuracy mode; poll until a fix shows up.
        let poll = async {
            loop {
                match self.location().await {
                    Ok(data) => {
                        if let Some(fix) = data.gps.as_ref().and_then(GpsLocation::fix) {
                            return fix;
                        }
                    }
                    Err(e) => debug!("GPS read failed: {}", e),
                }
                tokio::time::sleep(GPS_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.ok()
    }
}

#[async_trait]
impl SmsSender for ModemManager {
    fn has_permission(&self) -> bool {
        self.sms_enabled
    }

    async fn enqueue(&self, number: &str, body: &str) -> Result<(), SmsError> {
        if !self.sms_enabled {
            return Err(SmsError::PermissionDenied);
        }

        let create = format!(
            "--messaging-create-sms=number='{}',text='{}'",
            number.replace('\'', ""),
            body.replace('\'', " ")
        );
        let output = run_cmd("mmcli", &["-m", &self.modem_id, &create])
            .await
            .map_err(|e| SmsError::Unavailable(e.to_string()))?;
        let sms_id = parse_created_sms(&output)
            .ok_or_else(|| SmsError::Send(format!("unexpected mmcli output: {output}")))?;

        run_cmd("mmcli", &["-s", &sms_id, "--send"])
            .await
            .map_err(|e| SmsError::Send(e.to_string()))?;
        Ok(())
    }
}
