//! Refresh orchestration across all data sources
//!
//! One [`RefreshOrchestrator`] owns the hydrate cycle: a concurrent
//! fan-out across every adapter, assembled into a [`HydrateReport`] and
//! cached for renderers. It also owns every timer (the user-configured
//! master auto-refresh plus fixed-cadence per-source polls) with an
//! explicit start/stop lifecycle and a no-stacking guarantee: starting a
//! timer that is already running cancels the old one first, and stopping
//! aborts the pending tick rather than flagging it.
//!
//! Hydrate cycles are serialized. A trigger that arrives while a cycle
//! is in flight (manual refresh racing a scheduled one) is dropped and
//! reported as `None`, never queued.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::{clamp_master_interval, DashboardConfig, RefreshConfig};
use crate::events::Notice;
use crate::fetch::FetchGateway;
use crate::sources::{default_adapters, SourceAdapter};
use crate::types::{HydrateReport, Snapshot, SourceId};

/// Orchestrates hydrate cycles and refresh timers
///
/// Cheap to clone: clones share all state and act as handles onto the
/// same orchestrator, so background tasks can drive the same cycle
/// guard and snapshot cache the caller reads.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    /// Adapters in display order
    adapters: Vec<Arc<dyn SourceAdapter>>,
    /// Refresh cadences; master interval is mutable at runtime
    refresh: Arc<RwLock<RefreshConfig>>,
    /// Notice broadcaster for toast/feed display
    event_tx: broadcast::Sender<Notice>,
    /// Most recent snapshot per source, hydrate or poll
    latest: Arc<RwLock<HashMap<SourceId, Snapshot>>>,
    /// Most recent full report
    last_report: Arc<RwLock<Option<HydrateReport>>>,
    /// Cycle guard: true while a hydrate fan-out is running
    in_flight: Arc<AtomicBool>,
    /// Master auto-refresh timer task, if running
    master_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Per-source poll timer tasks, if running
    poll_tasks: Arc<Mutex<HashMap<SourceId, JoinHandle<()>>>>,
}

impl RefreshOrchestrator {
    /// Create an orchestrator over the given adapters
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, refresh: RefreshConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            adapters,
            refresh: Arc::new(RwLock::new(refresh)),
            event_tx,
            latest: Arc::new(RwLock::new(HashMap::new())),
            last_report: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
            master_task: Arc::new(Mutex::new(None)),
            poll_tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create an orchestrator with the standard adapter set
    pub fn from_config(gateway: Arc<dyn FetchGateway>, config: &DashboardConfig) -> Self {
        Self::new(
            default_adapters(gateway, &config.sources),
            config.refresh.clone(),
        )
    }

    /// Subscribe to orchestrator notices
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.event_tx.subscribe()
    }

    /// Run one hydrate cycle now
    ///
    /// Fans out `fetch_snapshot` across every adapter concurrently and
    /// waits for all of them; a slow or failing source never blocks the
    /// others, and the cycle itself cannot fail. Returns `None` only
    /// when a cycle was already in flight and this trigger was dropped.
    /// The in-flight guard is released on drop, so a cycle cancelled
    /// mid-fetch (timer stop or restart) never blocks later triggers.
    pub async fn hydrate(&self) -> Option<HydrateReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Hydrate already in flight, trigger dropped");
            return None;
        }
        let _guard = CycleGuard(self.in_flight.clone());

        let cycle_start = Utc::now();
        tracing::debug!("Hydrate cycle started");

        let fetches = self.adapters.iter().map(|a| a.fetch_snapshot());
        let snapshots = futures::future::join_all(fetches).await;
        let report = HydrateReport::from_snapshots(cycle_start, snapshots);

        {
            let mut latest = self.latest.write().await;
            for snapshot in report.results.values() {
                latest.insert(snapshot.source, snapshot.clone());
            }
        }

        for source in &report.failures {
            let _ = self
                .event_tx
                .send(Notice::source_failed(*source, "live fetch failed"));
        }
        let _ = self.event_tx.send(Notice::synced(report.failures.len()));

        *self.last_report.write().await = Some(report.clone());

        tracing::info!(
            sources = report.results.len(),
            failures = report.failures.len(),
            "Hydrate cycle completed"
        );

        Some(report)
    }

    /// Refresh a single source outside the hydrate cycle
    ///
    /// Used by the per-source poll timers. Updates the snapshot cache
    /// and emits a `source-failed` notice on fallback, but produces no
    /// report. Returns `None` for a source with no adapter.
    pub async fn refresh_source(&self, source: SourceId) -> Option<Snapshot> {
        let adapter = self.adapters.iter().find(|a| a.source() == source)?;
        let snapshot = adapter.fetch_snapshot().await;

        if snapshot.is_fallback() {
            let _ = self
                .event_tx
                .send(Notice::source_failed(source, "live fetch failed"));
        }

        self.latest.write().await.insert(source, snapshot.clone());
        tracing::debug!(source = %source, origin = ?snapshot.origin, "Source refreshed");
        Some(snapshot)
    }

    /// Latest cached snapshot for a source
    pub async fn latest(&self, source: SourceId) -> Option<Snapshot> {
        self.latest.read().await.get(&source).cloned()
    }

    /// Most recent hydrate report, if any cycle has completed
    pub async fn last_report(&self) -> Option<HydrateReport> {
        self.last_report.read().await.clone()
    }

    /// Start (or restart) the master auto-refresh timer
    ///
    /// If a timer is already running it is cancelled first; at most one
    /// master timer exists at any time. The first hydrate fires one
    /// full interval after the call, matching a user toggling refresh
    /// on, not immediately.
    pub async fn start_auto_refresh(&self) {
        let period = self.refresh.read().await.master_interval();
        let mut task = self.master_task.lock().await;

        if let Some(handle) = task.take() {
            handle.abort();
            tracing::debug!("Previous auto-refresh timer cancelled");
        }

        let worker = self.clone();
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; consume that tick so the
            // first hydrate waits one full period
            ticker.tick().await;
            loop {
                ticker.tick().await;
                worker.hydrate().await;
            }
        }));

        tracing::info!(interval_ms = period.as_millis() as u64, "Auto refresh started");
    }

    /// Stop the master auto-refresh timer, cancelling any pending tick
    pub async fn stop_auto_refresh(&self) {
        let mut task = self.master_task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
            tracing::info!("Auto refresh stopped");
        }
    }

    /// Whether the master auto-refresh timer is running
    pub async fn is_auto_refresh_running(&self) -> bool {
        self.master_task.lock().await.is_some()
    }

    /// Update the master interval, clamped to the allowed minimum
    ///
    /// If the auto-refresh timer is running it restarts on the new
    /// cadence; otherwise the value applies on the next start.
    pub async fn set_master_interval_ms(&self, ms: u64) {
        let clamped = clamp_master_interval(ms);
        {
            let mut refresh = self.refresh.write().await;
            refresh.master_interval_ms = clamped;
        }
        tracing::debug!(interval_ms = clamped, "Master interval updated");

        if self.is_auto_refresh_running().await {
            self.start_auto_refresh().await;
        }
    }

    /// Current master interval in milliseconds
    pub async fn master_interval_ms(&self) -> u64 {
        self.refresh.read().await.master_interval_ms
    }

    /// Start the fixed-cadence per-source poll timers
    ///
    /// One timer per entry in the configured poll map, each refreshing
    /// only its own source. Restarting cancels the previous timers.
    pub async fn start_source_polls(&self) {
        let polls = self.refresh.read().await.source_poll_ms.clone();
        let mut tasks = self.poll_tasks.lock().await;

        for (_, handle) in tasks.drain() {
            handle.abort();
        }

        for (source, ms) in polls {
            let worker = self.clone();
            let period = Duration::from_millis(ms.max(1_000));
            let handle = tokio::spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    worker.refresh_source(source).await;
                }
            });
            tasks.insert(source, handle);
            tracing::debug!(source = %source, interval_ms = ms, "Source poll started");
        }
    }

    /// Stop all per-source poll timers
    pub async fn stop_source_polls(&self) {
        let mut tasks = self.poll_tasks.lock().await;
        for (source, handle) in tasks.drain() {
            handle.abort();
            tracing::debug!(source = %source, "Source poll stopped");
        }
    }

    /// Stop every timer this orchestrator owns
    pub async fn shutdown(&self) {
        self.stop_auto_refresh().await;
        self.stop_source_polls().await;
        tracing::info!("Orchestrator shut down");
    }
}

/// Clears the in-flight flag when dropped
///
/// Held across the awaited part of a hydrate cycle, so a timer task
/// aborted mid-cycle still releases the guard.
struct CycleGuard(Arc<AtomicBool>);

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
