//! Runtime wiring and scheduling.
//!
//! Assembles the engine's services onto concrete adapters and drives
//! them on two independent cadences: a formation cycle (which also
//! submits whatever is due, so a freshly formed batch does not wait a
//! full interval) and a confirmation poll. A third task mirrors every
//! bus event into the log.

use crate::config::RuntimeConfig;
use crate::seed::seed_demo_records;
use anchor_engine::adapters::{BusNotifier, FileLease, InMemoryStore, MutexLease, ScriptedLedger};
use anchor_engine::{
    AnchorApi, AnchorService, EligibilityFilter, FormationLease, FormationOutcome, LeaseHandle,
};
use anchor_engine::error::AnchorResult;
use async_trait::async_trait;
use shared_bus::{EventFilter, InMemoryEventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Formation lease selected by configuration: in-process for a single
/// node, file-backed when a data directory is shared between processes.
pub enum RuntimeLease {
    InProcess(MutexLease),
    File(FileLease),
}

#[async_trait]
impl FormationLease for RuntimeLease {
    async fn try_acquire(&self) -> AnchorResult<Option<Box<dyn LeaseHandle>>> {
        match self {
            RuntimeLease::InProcess(lease) => lease.try_acquire().await,
            RuntimeLease::File(lease) => lease.try_acquire().await,
        }
    }
}

type Service = AnchorService<InMemoryStore, InMemoryStore, ScriptedLedger, RuntimeLease, BusNotifier>;

/// The assembled anchoring process.
pub struct AnchorRuntime {
    config: RuntimeConfig,
    service: Arc<Service>,
    store: InMemoryStore,
    bus: Arc<InMemoryEventBus>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AnchorRuntime {
    /// Wire every adapter and service. No tasks run until
    /// [`AnchorRuntime::start`].
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let store = InMemoryStore::new();
        let bus = Arc::new(InMemoryEventBus::new());

        // The scripted ledger mines a block per finality check so local
        // runs reach confirmation depth without an external chain.
        let ledger = Arc::new(ScriptedLedger::with_auto_mine(config.network.clone()));

        let lease = match &config.data_dir {
            Some(dir) => {
                info!("[runtime] formation lease: file lock in {}", dir.display());
                RuntimeLease::File(FileLease::new(dir)?)
            }
            None => RuntimeLease::InProcess(MutexLease::new()),
        };

        let service = Arc::new(AnchorService::new(
            config.engine.clone(),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            ledger,
            Arc::new(lease),
            Arc::new(BusNotifier::new(bus.clone())),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            service,
            store,
            bus,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Seed demo data, then spawn the scheduler and event-log tasks.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.config.demo_records > 0 {
            let seeded = seed_demo_records(&self.store, self.config.demo_records);
            info!("[runtime] seeded {seeded} demo records");
        }

        self.spawn_event_log();
        self.spawn_formation_loop();
        self.spawn_confirmation_loop();

        info!(
            "[runtime] anchoring pipeline running: formation every {}s, confirmation every {}s",
            self.config.formation_interval_secs, self.config.confirmation_interval_secs
        );
        Ok(())
    }

    /// Signal every task to stop and give them a moment to wind down.
    pub async fn shutdown(&self) {
        info!("[runtime] shutting down");
        if self.shutdown_tx.send(true).is_err() {
            warn!("[runtime] no tasks were listening for shutdown");
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        match self.service.status().await {
            Ok(status) => info!(
                "[runtime] final state: {} confirmed, {} in flight, {} failed, {} records unanchored",
                status.confirmed_batches,
                status.pending_batches + status.submitted_batches + status.anchored_batches,
                status.failed_batches,
                status.unanchored_transactions
            ),
            Err(e) => warn!("[runtime] could not read final status: {e}"),
        }
        info!("[runtime] shutdown complete");
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn store(&self) -> InMemoryStore {
        self.store.clone()
    }

    fn spawn_formation_loop(&self) {
        let service = self.service.clone();
        let mut shutdown = self.shutdown_rx.clone();
        let period = Duration::from_secs(self.config.formation_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => run_formation_cycle(&service).await,
                    _ = shutdown.changed() => {
                        info!("[former] shutdown signal received");
                        return;
                    }
                }
            }
        });
    }

    fn spawn_confirmation_loop(&self) {
        let service = self.service.clone();
        let mut shutdown = self.shutdown_rx.clone();
        let period = Duration::from_secs(self.config.confirmation_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.poll_confirmations().await {
                            Ok(report) if report == Default::default() => {}
                            Ok(report) => info!(
                                "[monitor] poll: {} confirmed, {} advanced, {} waiting, {} failed",
                                report.confirmed, report.advanced, report.waiting, report.failed
                            ),
                            Err(e) => error!("[monitor] poll cycle failed: {e}"),
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("[monitor] shutdown signal received");
                        return;
                    }
                }
            }
        });
    }

    /// Mirror every bus event into the structured log.
    fn spawn_event_log(&self) {
        let bus = self.bus.clone();
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut subscription = bus.subscribe(EventFilter::all()).await;
            loop {
                tokio::select! {
                    event = subscription.recv() => {
                        let Some(event) = event else { return };
                        let payload = serde_json::to_string(&event)
                            .unwrap_or_else(|e| format!("<unserializable: {e}>"));
                        info!(kind = event.kind(), "[events] {payload}");
                    }
                    _ = shutdown.changed() => {
                        info!("[events] shutdown signal received");
                        return;
                    }
                }
            }
        });
    }
}

async fn run_formation_cycle(service: &Service) {
    match service.form_batch(&EligibilityFilter::default()).await {
        Ok(FormationOutcome::Formed {
            batch_id,
            leaf_count,
            ..
        }) => info!("[former] formed batch {batch_id} with {leaf_count} leaves"),
        Ok(FormationOutcome::NotEnoughEligible { available }) => {
            info!("[former] skipped: only {available} eligible records")
        }
        Ok(FormationOutcome::LeaseHeld) => info!("[former] skipped: lease held elsewhere"),
        Err(e) => error!("[former] formation cycle failed: {e}"),
    }

    // Submit in the same cycle so new batches do not wait an interval.
    match service.submit_pending().await {
        Ok(report) if report == Default::default() => {}
        Ok(report) => info!(
            "[anchorer] submission: {} committed, {} deferred, {} failed, {} skipped",
            report.committed, report.deferred, report.failed, report.skipped
        ),
        Err(e) => error!("[anchorer] submission cycle failed: {e}"),
    }
}
