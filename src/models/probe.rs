use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network probes a drive test can run on each tick
///
/// Declaration order is the order probe notes are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Upload,
    Ping,
    Dns,
    Web,
    Sms,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 5] = [
        ProbeKind::Upload,
        ProbeKind::Ping,
        ProbeKind::Dns,
        ProbeKind::Web,
        ProbeKind::Sms,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProbeKind::Upload => "HTTP Upload",
            ProbeKind::Ping => "Ping",
            ProbeKind::Dns => "DNS",
            ProbeKind::Web => "Web",
            ProbeKind::Sms => "SMS",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload" | "http-upload" | "http_upload" => Ok(ProbeKind::Upload),
            "ping" => Ok(ProbeKind::Ping),
            "dns" => Ok(ProbeKind::Dns),
            "web" => Ok(ProbeKind::Web),
            "sms" => Ok(ProbeKind::Sms),
            other => Err(format!(
                "unknown probe '{other}' (expected upload, ping, dns, web or sms)"
            )),
        }
    }
}

/// Outcome of a single probe run
///
/// `metric` is `None` when the probe did not complete; `note` then says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub metric: Option<f64>,
    pub note: String,
}

impl ProbeResult {
    pub fn completed(metric: f64) -> Self {
        Self {
            metric: Some(metric),
            note: String::new(),
        }
    }

    pub fn completed_with_note(metric: f64, note: impl Into<String>) -> Self {
        Self {
            metric: Some(metric),
            note: note.into(),
        }
    }

    pub fn failed(note: impl Into<String>) -> Self {
        Self {
            metric: None,
            note: note.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.metric.is_some()
    }
}

/// Per-probe target strings configured for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeTargets {
    pub upload_url: String,
    pub ping_host: String,
    pub dns_host: String,
    pub web_url: String,
    pub sms_number: String,
}

impl ProbeTargets {
    pub fn target_for(&self, kind: ProbeKind) -> &str {
        match kind {
            ProbeKind::Upload => &self.upload_url,
            ProbeKind::Ping => &self.ping_host,
            ProbeKind::Dns => &self.dns_host,
            ProbeKind::Web => &self.web_url,
            ProbeKind::Sms => &self.sms_number,
        }
    }
}
