//! Periodic drive-test orchestration
//!
//! One spawned task drives the loop. Each tick acquires a fix, then samples
//! the radio while the probe suite runs, merges both into a [`DriveSample`]
//! and persists it. Ticks never overlap; stopping is cooperative and waits
//! for the tick in flight. Each tick runs in its own task, so a backend or
//! store that panics costs that tick only.

use chrono::Utc;
use log::{debug, error, info, warn};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use super::errors::{CollectorError, FailureClass, SkipReason};
use super::events::{CollectorEvent, CollectorStatus};
use super::session::{CollectionSession, SessionConfig};
use crate::collectors::platform::{Accuracy, CellInfoSource, LocationProvider};
use crate::collectors::probes::NetworkProbeSuite;
use crate::collectors::radio::RadioSampler;
use crate::models::DriveSample;
use crate::storage::SampleStore;

const EVENT_CAPACITY: usize = 64;

/// Outcome of one tick
#[derive(Debug)]
pub enum TickOutcome {
    Collected(DriveSample),
    Skipped(SkipReason),
}

struct RunningSession {
    cancel: CancellationToken,
    handle: JoinHandle<u64>,
}

/// Everything a tick needs; shared between the handle and the loop task
struct TickContext {
    device_id: String,
    location: Arc<dyn LocationProvider>,
    cells: Arc<dyn CellInfoSource>,
    probes: NetworkProbeSuite,
    store: Arc<dyn SampleStore>,
    sampler: RadioSampler,
    status: watch::Sender<CollectorStatus>,
    events: broadcast::Sender<CollectorEvent>,
}

/// Drives periodic collection: Idle -> Active -> Idle
pub struct DriveTestCollector {
    context: Arc<TickContext>,
    running: Mutex<Option<RunningSession>>,
}

impl DriveTestCollector {
    pub fn new(
        device_id: impl Into<String>,
        location: Arc<dyn LocationProvider>,
        cells: Arc<dyn CellInfoSource>,
        probes: NetworkProbeSuite,
        store: Arc<dyn SampleStore>,
    ) -> Self {
        let (status, _) = watch::channel(CollectorStatus::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context: Arc::new(TickContext {
                device_id: device_id.into(),
                location,
                cells,
                probes,
                store,
                sampler: RadioSampler::new(),
                status,
                events,
            }),
            running: Mutex::new(None),
        }
    }

    /// Starts collecting; the first tick runs immediately
    ///
    /// Starting twice is rejected without touching the running session.
    pub async fn start(&self, config: SessionConfig) -> Result<(), CollectorError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("Drive test start ignored: already running");
            return Err(CollectorError::AlreadyActive);
        }
        config.validate()?;

        info!(
            "Starting drive test: interval {:?}, probes {:?}",
            config.interval, config.probes
        );

        self.context
            .status
            .send_replace(CollectorStatus::collecting(0, None));
        let _ = self.context.events.send(CollectorEvent::Started {
            interval: config.interval,
            probes: config.probes.iter().copied().collect(),
        });

        let cancel = CancellationToken::new();
        let context = Arc::clone(&self.context);
        let session = CollectionSession::new(config);
        let handle = tokio::spawn(run_loop(context, session, cancel.clone()));

        *running = Some(RunningSession { cancel, handle });
        Ok(())
    }

    /// Stops collecting after the tick in flight; returns the session's sample count
    pub async fn stop(&self) -> Result<u64, CollectorError> {
        let mut running = self.running.lock().await;
        let Some(session) = running.take() else {
            warn!("Drive test stop ignored: not running");
            return Err(CollectorError::NotActive);
        };

        session.cancel.cancel();
        let total = match session.handle.await {
            Ok(total) => total,
            Err(e) => {
                error!("Drive test loop ended abnormally: {}", e);
                self.context.status.borrow().samples_collected
            }
        };

        let last_preview = self.context.status.borrow().last_preview.clone();
        self.context
            .status
            .send_replace(CollectorStatus::stopped(total, last_preview));
        let _ = self.context.events.send(CollectorEvent::Stopped {
            total_samples: total,
        });

        info!("Drive test stopped after {} samples", total);
        Ok(total)
    }

    /// Reads the published status, so it never waits on a `stop` in progress
    pub fn is_active(&self) -> bool {
        self.context.status.borrow().active
    }

    pub fn status(&self) -> CollectorStatus {
        self.context.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<CollectorStatus> {
        self.context.status.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectorEvent> {
        self.context.events.subscribe()
    }
}

async fn run_loop(
    context: Arc<TickContext>,
    session: CollectionSession,
    cancel: CancellationToken,
) -> u64 {
    let interval = session.config.interval;
    let session = Arc::new(Mutex::new(session));

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Runs to completion even when stop is requested meanwhile
        let tick = {
            let context = Arc::clone(&context);
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut session = session.lock().await;
                context.tick(&mut session).await;
            })
        };
        if let Err(e) = tick.await {
            let ticks = session.lock().await.ticks;
            context.tick_crashed(ticks, e);
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    let session = session.lock().await;
    if !session.backlog.is_empty() {
        warn!(
            "Drive test ended with {} unsaved samples in the backlog",
            session.backlog.len()
        );
    }
    session.samples_collected
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl TickContext {
    async fn tick(&self, session: &mut CollectionSession) -> TickOutcome {
        session.ticks += 1;
        let tick = session.ticks;

        let outcome = self.collect(session).await;
        match &outcome {
            TickOutcome::Collected(sample) => {
                let preview = sample.preview(session.samples_collected);
                debug!("Drive test tick #{} stored sample #{}", tick, session.samples_collected);
                self.status.send_replace(CollectorStatus::collecting(
                    session.samples_collected,
                    Some(preview.clone()),
                ));
                let _ = self.events.send(CollectorEvent::SampleCollected {
                    sample_number: session.samples_collected,
                    sample: sample.clone(),
                    preview,
                });
            }
            TickOutcome::Skipped(reason) => {
                let class = reason.class();
                warn!("Drive test tick #{} skipped ({}): {}", tick, class, reason);
                let _ = self.events.send(CollectorEvent::TickSkipped {
                    tick,
                    reason: reason.clone(),
                    class,
                });
            }
        }
        outcome
    }

    fn tick_crashed(&self, tick: u64, e: JoinError) {
        let message = if e.is_panic() {
            panic_message(e.into_panic().as_ref())
        } else {
            e.to_string()
        };
        error!("Drive test tick #{} crashed: {}", tick, message);

        let reason = SkipReason::Crashed(message);
        let class = reason.class();
        let _ = self.events.send(CollectorEvent::TickSkipped {
            tick,
            reason,
            class,
        });
    }

    async fn collect(&self, session: &mut CollectionSession) -> TickOutcome {
        let permission = self.location.permission();
        if !permission.is_granted() {
            return TickOutcome::Skipped(SkipReason::LocationPermissionMissing);
        }
        if !self.location.is_enabled().await {
            return TickOutcome::Skipped(SkipReason::LocationDisabled);
        }
        let Some(fix) = self
            .location
            .current_fix(Accuracy::High, session.config.location_timeout)
            .await
        else {
            return TickOutcome::Skipped(SkipReason::NoLocationFix);
        };
        let timestamp = Utc::now().timestamp_millis();

        let capability = self.cells.capabilities();
        let config = &session.config;
        let (snapshot, report) = tokio::join!(
            tokio::time::timeout(config.cell_timeout, self.cells.snapshot()),
            self.probes.run(&config.probes, &config.targets)
        );

        let (snapshot, cell_notes) = match snapshot {
            Ok(Ok(snapshot)) => (Some(snapshot), String::new()),
            Ok(Err(e)) => {
                warn!("Cell info unavailable: {:#}", e);
                (None, format!("Cell info error: {e}"))
            }
            Err(_) => {
                warn!("Cell info read timed out after {:?}", config.cell_timeout);
                (
                    None,
                    format!("Cell info error: timed out after {:?}", config.cell_timeout),
                )
            }
        };
        let cell = self
            .sampler
            .sample(snapshot.as_ref(), capability, permission, &cell_notes);

        for (kind, result) in report.results() {
            if !result.is_complete() {
                debug!("{}: {} probe: {}", FailureClass::ProbeFailure, kind, result.note);
            }
        }

        let sample = DriveSample::merge(
            self.device_id.clone(),
            timestamp,
            fix,
            cell,
            report.results(),
            report.notes(),
        );
        self.persist(session, sample)
    }

    fn persist(&self, session: &mut CollectionSession, sample: DriveSample) -> TickOutcome {
        if !session.backlog.is_empty() {
            match session.backlog.flush(self.store.as_ref()) {
                Ok(flushed) => {
                    info!("Stored {} samples from the backlog", flushed);
                    session.samples_collected += flushed as u64;
                }
                Err(e) => debug!("Backlog flush failed: {}", e),
            }
        }

        match self.store.insert(&sample) {
            Ok(id) => {
                session.samples_collected += 1;
                TickOutcome::Collected(sample.with_id(id))
            }
            Err(e) => {
                error!("Failed to store sample: {}", e);
                let reason = SkipReason::store_rejected(&e);
                session.backlog.push(sample);
                TickOutcome::Skipped(reason)
            }
        }
    }
}
