use anyhow::{Context, Result, bail};
use chrono::{Duration as ChronoDuration, Utc};
use log::info;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::collectors::radio::ChannelFamily;
use crate::collectors::radio::frequency;
use crate::config::Settings;
use crate::export::export_jsonl;
use crate::models::{DriveSample, METRIC_UNKNOWN, ProbeKind, Technology};
use crate::remote::{CollectorClient, SignupOutcome};
use crate::storage::SampleStore;

/// Aggregates over a set of stored samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub total: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub per_technology: BTreeMap<String, usize>,
    pub per_operator: BTreeMap<String, usize>,
    /// Mean metric per probe kind over samples where the probe completed
    pub probe_averages: BTreeMap<ProbeKind, f64>,
}

impl SampleSummary {
    pub fn from_samples(samples: &[DriveSample]) -> Self {
        let mut per_technology = BTreeMap::new();
        let mut per_operator = BTreeMap::new();
        let mut sums: BTreeMap<ProbeKind, (f64, usize)> = BTreeMap::new();

        for sample in samples {
            *per_technology
                .entry(sample.cell.technology.label().to_string())
                .or_insert(0) += 1;
            *per_operator
                .entry(sample.cell.operator_name.clone())
                .or_insert(0) += 1;
            for kind in ProbeKind::ALL {
                let value = sample.metric(kind);
                if value != METRIC_UNKNOWN {
                    let entry = sums.entry(kind).or_insert((0.0, 0));
                    entry.0 += value;
                    entry.1 += 1;
                }
            }
        }

        Self {
            total: samples.len(),
            first_timestamp: samples.iter().map(|s| s.timestamp).min(),
            last_timestamp: samples.iter().map(|s| s.timestamp).max(),
            per_technology,
            per_operator,
            probe_averages: sums
                .into_iter()
                .map(|(kind, (sum, n))| (kind, sum / n as f64))
                .collect(),
        }
    }
}

fn format_metric(kind: ProbeKind, value: f64) -> String {
    if value == METRIC_UNKNOWN {
        return "-".to_string();
    }
    match kind {
        ProbeKind::Upload => format!("{value:.1} KB/s"),
        _ => format!("{value:.0} ms"),
    }
}

pub struct DataCommandHandler {
    settings: Settings,
    store: Arc<dyn SampleStore>,
}

impl DataCommandHandler {
    pub fn new(settings: Settings, store: Arc<dyn SampleStore>) -> Self {
        Self { settings, store }
    }

    pub fn handle_export_command(&self, output: Option<&Path>) -> Result<()> {
        let dir = output.unwrap_or(self.settings.storage.data_dir.as_path());
        let path = export_jsonl(self.store.as_ref(), dir)?;
        println!("✅ Data exported to {}", path.display());
        Ok(())
    }

    pub async fn handle_upload_command(&self, server: Option<String>) -> Result<()> {
        let samples = self.store.query_all().context("Failed to read samples")?;
        if samples.is_empty() {
            println!("No data to upload");
            return Ok(());
        }

        let client = self.client(server)?;
        println!("📤 Uploading {} samples to {}", samples.len(), client.base_url());
        let sent = client.upload(&samples).await?;
        println!("✅ Uploaded {sent} samples");
        Ok(())
    }

    pub async fn handle_signup_command(
        &self,
        username: &str,
        password: &str,
        server: Option<String>,
    ) -> Result<()> {
        let device_id = self.settings.resolve_device_id()?;
        let client = self.client(server)?;
        match client.signup(username, password, &device_id).await? {
            SignupOutcome::Registered => println!("✅ Signup successful for {username}"),
            SignupOutcome::AlreadyRegistered => {
                println!("✅ {username} is already registered, continuing")
            }
        }
        Ok(())
    }

    /// Samples matching every given filter, newest first
    ///
    /// `technology` accepts the aliases of [`Technology::from_label`], e.g. "5g".
    fn history_samples(
        &self,
        hours: Option<u32>,
        technology: Option<&str>,
        operator: Option<&str>,
    ) -> Result<Vec<DriveSample>> {
        let technology = technology.map(Technology::from_label);
        let mut samples = match (hours, technology, operator) {
            (Some(hours), _, _) => {
                let end = Utc::now().timestamp_millis();
                let start = end - ChronoDuration::hours(i64::from(hours)).num_milliseconds();
                self.store.query_by_time_range(start, end)?
            }
            (None, Some(technology), _) => self.store.query_by_technology(technology.label())?,
            (None, None, Some(operator)) => self.store.query_by_operator(operator)?,
            (None, None, None) => self.store.query_all()?,
        };
        if let Some(technology) = technology {
            samples.retain(|s| s.cell.technology == technology);
        }
        if let Some(operator) = operator {
            samples.retain(|s| s.cell.operator_name == operator);
        }
        Ok(samples)
    }

    pub fn handle_history_command(
        &self,
        limit: usize,
        hours: Option<u32>,
        technology: Option<&str>,
        operator: Option<&str>,
    ) -> Result<()> {
        let samples = self.history_samples(hours, technology, operator)?;
        if samples.is_empty() {
            println!("No samples stored");
            return Ok(());
        }

        println!(
            "{:<19}  {:<7}  {:<16}  {:>11}  {:>11}  {:>12}  {:>8}  {:>8}",
            "Time", "Tech", "Operator", "Latitude", "Longitude", "Upload", "Ping", "DNS"
        );
        println!("{}", "-".repeat(104));
        for sample in samples.iter().take(limit) {
            println!(
                "{:<19}  {:<7}  {:<16}  {:>11.6}  {:>11.6}  {:>12}  {:>8}  {:>8}",
                sample.timestamp_formatted(),
                sample.cell.technology.label(),
                sample.cell.operator_name,
                sample.latitude,
                sample.longitude,
                format_metric(ProbeKind::Upload, sample.http_upload_rate),
                format_metric(ProbeKind::Ping, sample.ping_response_time),
                format_metric(ProbeKind::Dns, sample.dns_response_time),
            );
        }
        if samples.len() > limit {
            println!("... {} more", samples.len() - limit);
        }
        Ok(())
    }

    pub fn handle_stats_command(&self) -> Result<()> {
        let samples = self.store.query_all()?;
        let summary = SampleSummary::from_samples(&samples);

        println!("Drive Test Statistics");
        println!("=====================");
        println!("Samples: {}", summary.total);
        if summary.total == 0 {
            return Ok(());
        }

        let first = samples.iter().min_by_key(|s| s.timestamp);
        let last = samples.iter().max_by_key(|s| s.timestamp);
        if let (Some(first), Some(last)) = (first, last) {
            println!("Period:  {} - {}", first.timestamp_formatted(), last.timestamp_formatted());
        }

        println!("\nBy technology:");
        for (technology, count) in &summary.per_technology {
            println!("  {technology:<8} {count}");
        }
        println!("\nBy operator:");
        for (operator, count) in &summary.per_operator {
            println!("  {operator:<16} {count}");
        }
        println!("\nProbe averages:");
        for kind in ProbeKind::ALL {
            let value = summary.probe_averages.get(&kind).copied().unwrap_or(METRIC_UNKNOWN);
            println!("  {:<12} {}", kind.label(), format_metric(kind, value));
        }
        Ok(())
    }

    pub fn handle_cleanup_command(&self, days: Option<u32>) -> Result<()> {
        let days = days.unwrap_or(self.settings.retention.days);
        let cutoff = Utc::now() - ChronoDuration::days(i64::from(days));
        let removed = self.store.delete_older_than(cutoff.timestamp_millis())?;
        info!("Retention cleanup removed {} samples older than {} days", removed, days);
        println!("🧹 Removed {removed} samples older than {days} days");
        Ok(())
    }

    pub fn handle_wipe_command(&self, confirmed: bool) -> Result<()> {
        if !confirmed {
            bail!("Refusing to delete all samples without --yes");
        }
        let removed = self.store.delete_all()?;
        println!("🗑️  Deleted {removed} samples");
        Ok(())
    }

    fn client(&self, server: Option<String>) -> Result<CollectorClient> {
        let base_url = server.unwrap_or_else(|| self.settings.server.base_url.clone());
        Ok(CollectorClient::new(base_url, self.settings.server_timeout())?)
    }
}

pub fn handle_band_command(family: ChannelFamily, channel: i32) {
    let info = frequency::lookup(family, channel);
    println!("{} channel {}", family, channel);
    println!("  Band:      {}", info.band_label);
    println!("  Frequency: {}", info.frequency_label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellMeasurementBuilder, Location, ProbeResult};
    use crate::storage::SqliteSampleStore;

    fn sample(timestamp: i64, technology: Technology, operator: &str, ping: Option<f64>) -> DriveSample {
        let mut cell = CellMeasurementBuilder::default();
        cell.technology(technology).operator_name(operator);
        let mut probes = BTreeMap::new();
        if let Some(ping) = ping {
            probes.insert(ProbeKind::Ping, ProbeResult::completed(ping));
        }
        DriveSample::merge("dev", timestamp, Location::new(1.0, 2.0), cell.build(), &probes, "")
    }

    #[test]
    fn test_summary_skips_unknown_metrics() {
        let samples = vec![
            sample(3_000, Technology::Lte, "Telia", Some(20.0)),
            sample(1_000, Technology::Lte, "Telia", Some(40.0)),
            sample(2_000, Technology::Gsm, "Elisa", None),
        ];

        let summary = SampleSummary::from_samples(&samples);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.first_timestamp, Some(1_000));
        assert_eq!(summary.last_timestamp, Some(3_000));
        assert_eq!(summary.per_technology.get("LTE"), Some(&2));
        assert_eq!(summary.per_operator.get("Elisa"), Some(&1));
        assert_eq!(summary.probe_averages.get(&ProbeKind::Ping), Some(&30.0));
        assert!(!summary.probe_averages.contains_key(&ProbeKind::Dns));
    }

    #[test]
    fn test_cleanup_and_wipe() {
        let store = Arc::new(SqliteSampleStore::open_in_memory().unwrap());
        let now = Utc::now().timestamp_millis();
        let old = now - ChronoDuration::days(40).num_milliseconds();
        store.insert(&sample(old, Technology::Lte, "Telia", None)).unwrap();
        store.insert(&sample(now, Technology::Lte, "Telia", None)).unwrap();

        let handler = DataCommandHandler::new(Settings::default(), store.clone());

        handler.handle_cleanup_command(Some(30)).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        assert!(handler.handle_wipe_command(false).is_err());
        assert_eq!(store.count().unwrap(), 1);
        handler.handle_wipe_command(true).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_history_technology_aliases() {
        let store = Arc::new(SqliteSampleStore::open_in_memory().unwrap());
        let now = Utc::now().timestamp_millis();
        store.insert(&sample(now - 2_000, Technology::Nr, "Telia", None)).unwrap();
        store.insert(&sample(now - 1_000, Technology::Wcdma, "Telia", None)).unwrap();
        store.insert(&sample(now, Technology::Lte, "Elisa", None)).unwrap();
        let handler = DataCommandHandler::new(Settings::default(), store);

        let nr = handler.history_samples(None, Some("5G"), None).unwrap();
        assert_eq!(nr.len(), 1);
        assert_eq!(nr[0].cell.technology, Technology::Nr);

        let umts = handler.history_samples(Some(1), Some("umts"), Some("Telia")).unwrap();
        assert_eq!(umts.len(), 1);
        assert_eq!(umts[0].cell.technology, Technology::Wcdma);

        let lte = handler.history_samples(None, Some("lte"), Some("Telia")).unwrap();
        assert!(lte.is_empty());
        assert!(handler.handle_history_command(20, None, Some("5g"), None).is_ok());
    }

    #[test]
    fn test_metric_formatting() {
        assert_eq!(format_metric(ProbeKind::Upload, 12.345), "12.3 KB/s");
        assert_eq!(format_metric(ProbeKind::Ping, 41.6), "42 ms");
        assert_eq!(format_metric(ProbeKind::Dns, METRIC_UNKNOWN), "-");
    }
}
