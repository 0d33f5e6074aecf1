use serde::{Deserialize, Serialize};

use crate::models::DriveSample;

/// Wire form of one sample, shared by collector uploads and JSONL exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: i64,
    pub device_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// `yyyy-MM-dd HH:mm:ss` in local time
    pub timestamp_formatted: String,
    pub latitude: f64,
    pub longitude: f64,
    pub technology: String,
    pub plmn_id: String,
    pub lac: i32,
    pub rac: i32,
    pub tac: i32,
    pub cell_id: i64,
    pub frequency_band: String,
    pub arfcn: i32,
    pub actual_frequency: String,
    pub rsrp: i32,
    pub rsrq: i32,
    pub rscp: i32,
    pub ec_no: i32,
    pub rx_lev: i32,
    pub sinr: i32,
    pub operator_name: String,
    pub notes: String,
    pub http_upload_rate: f64,
    pub ping_response_time: f64,
    pub dns_response_time: f64,
    pub web_response_time: f64,
    /// Enqueue latency; the key name is what the collector service expects
    pub sms_delivery_time: f64,
    pub test_notes: String,
}

impl From<&DriveSample> for UploadRecord {
    fn from(sample: &DriveSample) -> Self {
        let cell = &sample.cell;
        Self {
            id: sample.id.unwrap_or(0),
            device_id: sample.device_id.clone(),
            timestamp: sample.timestamp,
            timestamp_formatted: sample.timestamp_formatted(),
            latitude: sample.latitude,
            longitude: sample.longitude,
            technology: cell.technology.label().to_string(),
            plmn_id: cell.plmn_id.clone(),
            lac: cell.lac,
            rac: cell.rac,
            tac: cell.tac,
            cell_id: cell.cell_id,
            frequency_band: cell.frequency_band.clone(),
            arfcn: cell.arfcn,
            actual_frequency: cell.actual_frequency.clone(),
            rsrp: cell.rsrp,
            rsrq: cell.rsrq,
            rscp: cell.rscp,
            ec_no: cell.ec_no,
            rx_lev: cell.rx_lev,
            sinr: cell.sinr,
            operator_name: cell.operator_name.clone(),
            notes: cell.notes.clone(),
            http_upload_rate: sample.http_upload_rate,
            ping_response_time: sample.ping_response_time,
            dns_response_time: sample.dns_response_time,
            web_response_time: sample.web_response_time,
            sms_delivery_time: sample.sms_enqueue_ms,
            test_notes: sample.test_notes.clone(),
        }
    }
}
