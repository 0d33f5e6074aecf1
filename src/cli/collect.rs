use anyhow::{Context, Result};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::collectors::drive_test::{CollectorEvent, DriveTestCollector};
use crate::collectors::platform::{
    CellInfoSource, LocationProvider, ModemManager, SmsSender, StaticLocation,
};
use crate::collectors::probes::NetworkProbeSuite;
use crate::config::{LocationSource, Settings};
use crate::models::ProbeKind;
use crate::storage::SampleStore;

pub struct CollectCommandHandler {
    settings: Settings,
    store: Arc<dyn SampleStore>,
}

impl CollectCommandHandler {
    pub fn new(settings: Settings, store: Arc<dyn SampleStore>) -> Self {
        Self { settings, store }
    }

    pub async fn handle_collect_command(
        &self,
        interval: Option<u64>,
        probes: Option<Vec<ProbeKind>>,
        duration: Option<u64>,
    ) -> Result<()> {
        let mut settings = self.settings.clone();
        if let Some(interval) = interval {
            settings.collection.interval_secs = interval;
        }
        if let Some(probes) = probes {
            settings.collection.probes = probes;
        }
        settings.validate()?;

        let collector = self.build_collector(&settings).await?;
        let config = settings.session_config();

        println!("📡 Starting drive test (Press Ctrl+C to stop)");
        println!("   Interval: {}s", settings.collection.interval_secs);
        println!(
            "   Probes:   {}",
            if config.probes.is_empty() {
                "none".to_string()
            } else {
                config
                    .probes
                    .iter()
                    .map(ProbeKind::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        );
        println!();

        let mut events = collector.subscribe();
        collector.start(config).await?;

        let stop_after = async {
            match duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(stop_after);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                    }
                    println!("\n⏹️  Stopping after the current sample...");
                    break;
                }
                _ = &mut stop_after => {
                    println!("\n⏰ Collection duration completed");
                    break;
                }
                event = events.recv() => match event {
                    Ok(CollectorEvent::SampleCollected { sample_number, preview, .. }) => {
                        println!("── Sample #{sample_number} ──");
                        println!("{preview}");
                    }
                    Ok(CollectorEvent::TickSkipped { tick, reason, class }) => {
                        println!("⚠️  Tick #{tick} skipped ({class}): {reason}");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Display fell behind, {} events missed", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }

        let total = collector.stop().await?;
        println!("✅ {}", collector.status().message);
        info!("Collection finished with {} samples", total);
        Ok(())
    }

    async fn build_collector(&self, settings: &Settings) -> Result<DriveTestCollector> {
        let modem = if settings.modem.id.trim().is_empty() {
            ModemManager::discover(settings.modem.capability)
                .await
                .context("Failed to find a modem; set modem.id to pick one explicitly")?
        } else {
            ModemManager::new(settings.modem.id.trim(), settings.modem.capability)
        };
        let modem = Arc::new(modem.with_sms(settings.modem.sms_enabled));
        info!("Using modem {}", modem.modem_id());

        let location: Arc<dyn LocationProvider> = match settings.location.source {
            LocationSource::Modem => modem.clone(),
            LocationSource::Static => Arc::new(StaticLocation::new(
                settings.location.latitude,
                settings.location.longitude,
            )),
        };
        let cells: Arc<dyn CellInfoSource> = modem.clone();
        let sms: Option<Arc<dyn SmsSender>> = if settings.modem.sms_enabled {
            Some(modem.clone())
        } else {
            None
        };

        let probes = NetworkProbeSuite::standard(settings.probe_timeout(), sms)?;
        let device_id = settings.resolve_device_id()?;

        Ok(DriveTestCollector::new(
            device_id,
            location,
            cells,
            probes,
            Arc::clone(&self.store),
        ))
    }
}
