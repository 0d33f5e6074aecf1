//! Layered settings
//!
//! Built-in defaults, then an optional TOML file, then `POLARIS_*`
//! environment variables (`__` separates nested keys, e.g.
//! `POLARIS_COLLECTION__INTERVAL_SECS=10`). Command-line flags are applied on
//! top by the CLI.

use anyhow::{Context, Result, bail};
use ::config::{Config, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::collectors::drive_test::SessionConfig;
use crate::collectors::radio::CapabilityLevel;
use crate::models::{ProbeKind, ProbeTargets};

pub const DEFAULT_CONFIG_FILE: &str = "polaris.toml";
const DEVICE_ID_FILE: &str = "device_id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed device identifier; empty means generate one and keep it in the data dir
    pub device_id: String,
    pub storage: StorageSettings,
    pub collection: CollectionSettings,
    pub targets: ProbeTargets,
    pub timeouts: TimeoutSettings,
    pub server: ServerSettings,
    pub location: LocationSettings,
    pub modem: ModemSettings,
    pub retention: RetentionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub interval_secs: u64,
    pub location_timeout_secs: u64,
    pub probes: Vec<ProbeKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Upper bound for each probe in a tick
    pub probe_secs: u64,
    /// Upper bound for reading the serving cell in a tick
    pub cell_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// GPS of the ModemManager modem
    Modem,
    /// Fixed coordinates from these settings
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    pub source: LocationSource,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemSettings {
    /// ModemManager modem index; empty means the first listed modem
    pub id: String,
    pub capability: CapabilityLevel,
    pub sms_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    /// Default age cut-off used by `cleanup`
    pub days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            storage: StorageSettings::default(),
            collection: CollectionSettings::default(),
            targets: ProbeTargets {
                upload_url: "httpbin.org/post".to_string(),
                ping_host: "8.8.8.8".to_string(),
                dns_host: "google.com".to_string(),
                web_url: "www.google.com".to_string(),
                sms_number: String::new(),
            },
            timeouts: TimeoutSettings::default(),
            server: ServerSettings::default(),
            location: LocationSettings::default(),
            modem: ModemSettings::default(),
            retention: RetentionSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("polaris-data"),
            database: "polaris.db".to_string(),
        }
    }
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            location_timeout_secs: 10,
            probes: vec![ProbeKind::Upload, ProbeKind::Ping, ProbeKind::Dns, ProbeKind::Web],
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            probe_secs: 30,
            cell_secs: 10,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            source: LocationSource::Modem,
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            capability: CapabilityLevel::FULL,
            sms_enabled: false,
        }
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self { days: 30 }
    }
}

impl Settings {
    /// Loads and validates settings
    ///
    /// An explicit `path` must exist; otherwise `polaris.toml` in the working
    /// directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default()).context("Invalid default settings")?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("POLARIS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("collection.probes"),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let interval = self.collection.interval_secs;
        if !(1..=3600).contains(&interval) {
            bail!("collection.interval_secs must be between 1 and 3600, got {interval}");
        }
        if self.collection.location_timeout_secs == 0 {
            bail!("collection.location_timeout_secs must be greater than zero");
        }
        if self.timeouts.probe_secs == 0 {
            bail!("timeouts.probe_secs must be greater than zero");
        }
        if self.timeouts.cell_secs == 0 {
            bail!("timeouts.cell_secs must be greater than zero");
        }
        if self.server.timeout_secs == 0 {
            bail!("server.timeout_secs must be greater than zero");
        }
        if self.location.source == LocationSource::Static
            && (!(-90.0..=90.0).contains(&self.location.latitude)
                || !(-180.0..=180.0).contains(&self.location.longitude))
        {
            bail!(
                "static location {}, {} is not a valid coordinate",
                self.location.latitude,
                self.location.longitude
            );
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.probe_secs)
    }

    pub fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn session_config(&self) -> SessionConfig {
        let probes: BTreeSet<ProbeKind> = self.collection.probes.iter().copied().collect();
        SessionConfig::new(probes, self.targets.clone())
            .with_interval(Duration::from_secs(self.collection.interval_secs))
            .with_location_timeout(Duration::from_secs(self.collection.location_timeout_secs))
            .with_cell_timeout(Duration::from_secs(self.timeouts.cell_secs))
    }

    /// The configured device id, or the one persisted in the data dir
    ///
    /// A new random id is generated and stored on first use.
    pub fn resolve_device_id(&self) -> Result<String> {
        if !self.device_id.trim().is_empty() {
            return Ok(self.device_id.trim().to_string());
        }

        let path = self.storage.data_dir.join(DEVICE_ID_FILE);
        if let Ok(existing) = fs::read_to_string(&path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let id = Uuid::new_v4().to_string();
        fs::create_dir_all(&self.storage.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.storage.data_dir.display())
        })?;
        fs::write(&path, &id)
            .with_context(|| format!("Failed to store device id in {}", path.display()))?;
        info!("Generated device id {}", id);
        Ok(id)
    }
}
