// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The offline engine.
//!
//! [`OfflineEngine`] owns every component and is the only object the rest
//! of the application talks to. Components share one `Shared` value; the
//! background tasks (monitor, reconnection) hold weak references to it so
//! dropping the engine ends them.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use sb_core::{
    ConnectivityStatus, CourseView, DataChanged, DurableStore, Fields, QueuedOperation, Reconnected,
    RecordId, StampClock, SyncReport,
};

use super::broadcast::{Hub, StatusBroadcaster, Subscription};
use super::cache::LocalCache;
use super::gateway::ListQuery;
use super::network::NetworkSignal;
use super::probe::{ConnectivityProbe, ProbeConfig};
use super::queue::OperationLog;
use super::reconcile::{IdRemap, ReconcileOutcome, Reconciler};
use super::reconnect::{Prober, ReconnectController, ReconnectState, DEFAULT_INTERVAL};
use super::transport::Backend;
use crate::error::Result;

/// Timing and endpoint settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub probe: ProbeConfig,
    /// Spacing of reconnection attempts while the server is down.
    pub reconnect_interval: Duration,
    /// Spacing of background status checks while started.
    pub monitor_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            probe: ProbeConfig::default(),
            reconnect_interval: DEFAULT_INTERVAL,
            monitor_interval: Duration::from_secs(30),
        }
    }
}

/// Who produced a status being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Origin {
    Monitor,
    Reconnect,
    Manual,
    /// A request or a pass hit a dead server.
    Failure,
}

/// State shared by the engine and its background tasks.
pub(super) struct Shared {
    pub(super) me: Weak<Shared>,
    pub(super) backend: Arc<dyn Backend>,
    pub(super) probe: ConnectivityProbe,
    pub(super) reconnect: ReconnectController,
    pub(super) log: Arc<OperationLog>,
    pub(super) cache: Arc<LocalCache>,
    pub(super) reconciler: Reconciler,
    pub(super) clock: StampClock,
    pub(super) status: StatusBroadcaster,
    pub(super) data_changed: Hub<DataChanged>,
    pub(super) sync_complete: Hub<SyncReport>,
    pub(super) reconnected: Hub<Reconnected>,
    /// Placeholder ids the server has confirmed, this run or earlier.
    pub(super) confirmed_ids: Mutex<IdRemap>,
}

impl Shared {
    /// Records a status and runs the transitions that follow from it.
    ///
    /// Returns true if the caller should reconcile: the server just came
    /// back.
    pub(super) fn record(&self, status: ConnectivityStatus, origin: Origin) -> bool {
        let previous = self.status.update(status);

        if status.is_server_available() {
            let was_reconnecting = self.reconnect.is_active();
            self.reconnect.stop();
            if was_reconnecting && origin != Origin::Manual {
                self.reconnected.publish(&Reconnected { manual: false });
            }
            return !previous.is_server_available();
        }

        if status.is_online() {
            let prober: Weak<dyn Prober> = self.me.clone();
            self.reconnect.start(prober);
        } else {
            self.reconnect.stop();
        }
        false
    }

    /// Records a status and reconciles if the server just came back or is
    /// up with changes still queued.
    pub(super) async fn observe(&self, status: ConnectivityStatus, origin: Origin) {
        let recovered = self.record(status, origin);
        if recovered || (status.is_server_available() && self.has_backlog()) {
            if let Err(e) = self.reconcile().await {
                tracing::warn!(error = %e, "reconciliation failed");
            }
        }
    }

    fn has_backlog(&self) -> bool {
        match self.log.is_empty() {
            Ok(empty) => !empty,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read operation log");
                false
            }
        }
    }

    /// Marks the server unreachable after a failed call.
    pub(super) fn server_lost(&self) {
        let status = ConnectivityStatus::new(self.probe.network_online(), false);
        self.record(status, Origin::Failure);
    }

    pub(super) async fn reconcile(&self) -> Result<ReconcileOutcome> {
        if !self.probe.network_online() || !self.status.current().is_server_available() {
            return Ok(ReconcileOutcome::Unavailable);
        }
        let Some(pass) = self.reconciler.run().await? else {
            return Ok(ReconcileOutcome::Busy);
        };

        self.confirmed_ids.lock().unwrap_or_else(|e| e.into_inner()).extend(pass.remap);
        if pass.server_unreachable {
            self.server_lost();
        }
        if !pass.report.results.is_empty() {
            self.sync_complete.publish(&pass.report);
        }
        Ok(ReconcileOutcome::Completed(pass.report))
    }

    /// Resolves a placeholder the server has already confirmed.
    pub(super) fn resolve(&self, id: RecordId) -> RecordId {
        match id {
            RecordId::Local(local) => self
                .confirmed_ids
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .get(&local)
                .map_or(id, |server| RecordId::Server(*server)),
            server => server,
        }
    }
}

impl Prober for Shared {
    fn check(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let status = self.probe.probe().await;
            self.observe(status, Origin::Reconnect).await;
            status.is_server_available()
        })
    }
}

/// Offline-resilient access to the course catalog.
pub struct OfflineEngine {
    shared: Arc<Shared>,
    monitor_interval: Duration,
    monitor: Mutex<Option<CancellationToken>>,
}

impl OfflineEngine {
    pub fn new(
        backend: Arc<dyn Backend>,
        network: Arc<dyn NetworkSignal>,
        store: Arc<dyn DurableStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::with_clock(backend, network, store, config, StampClock::new())
    }

    /// Like [`OfflineEngine::new`] with an explicit stamp clock.
    pub fn with_clock(
        backend: Arc<dyn Backend>,
        network: Arc<dyn NetworkSignal>,
        store: Arc<dyn DurableStore>,
        config: EngineConfig,
        clock: StampClock,
    ) -> Result<Self> {
        let log = Arc::new(OperationLog::new(Arc::clone(&store)));
        let cache = Arc::new(LocalCache::new(store));

        // Stamps from a previous run must stay behind the ones we issue.
        if let Some(newest) = log.newest_stamp()? {
            clock.observe(newest);
        }
        let confirmed_ids = log.confirmed_ids()?;

        let initial = ConnectivityStatus::new(network.is_online(), false);
        let reconciler = Reconciler::new(Arc::clone(&backend), Arc::clone(&log), Arc::clone(&cache));
        let probe = ConnectivityProbe::new(Arc::clone(&backend), network, config.probe);

        let shared = Arc::new_cyclic(|me| Shared {
            me: me.clone(),
            backend,
            probe,
            reconnect: ReconnectController::new(config.reconnect_interval),
            log,
            cache,
            reconciler,
            clock,
            status: StatusBroadcaster::new(initial),
            data_changed: Hub::new(),
            sync_complete: Hub::new(),
            reconnected: Hub::new(),
            confirmed_ids: Mutex::new(confirmed_ids),
        });

        Ok(OfflineEngine { shared, monitor_interval: config.monitor_interval, monitor: Mutex::new(None) })
    }

    /// Probes once (reconciling anything left from a previous run) and
    /// starts the background monitor. Calling it again only probes.
    pub async fn start(&self) -> ConnectivityStatus {
        let status = self.probe().await;

        let mut monitor = self.monitor.lock().unwrap_or_else(|e| e.into_inner());
        if monitor.is_none() {
            let token = CancellationToken::new();
            tokio::spawn(run_monitor(Arc::downgrade(&self.shared), self.monitor_interval, token.clone()));
            *monitor = Some(token);
            tracing::debug!(interval = ?self.monitor_interval, "status monitor started");
        }
        status
    }

    /// Cancels the monitor and any reconnection schedule. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.monitor.lock().unwrap_or_else(|e| e.into_inner()).take() {
            token.cancel();
            tracing::debug!("status monitor stopped");
        }
        self.shared.reconnect.stop();
    }

    /// Last recorded connectivity status.
    pub fn status(&self) -> ConnectivityStatus {
        self.shared.status.current()
    }

    /// Calls `callback` with the current status now and on every change.
    pub fn subscribe(&self, callback: impl Fn(&ConnectivityStatus) + Send + Sync + 'static) -> Subscription {
        self.shared.status.subscribe(callback)
    }

    pub fn on_data_changed(&self, callback: impl Fn(&DataChanged) + Send + Sync + 'static) -> Subscription {
        self.shared.data_changed.subscribe(callback)
    }

    /// Called after every reconciliation pass that replayed something.
    pub fn on_sync_complete(&self, callback: impl Fn(&SyncReport) + Send + Sync + 'static) -> Subscription {
        self.shared.sync_complete.subscribe(callback)
    }

    pub fn on_reconnected(&self, callback: impl Fn(&Reconnected) + Send + Sync + 'static) -> Subscription {
        self.shared.reconnected.subscribe(callback)
    }

    pub fn pending_operation_count(&self) -> Result<usize> {
        Ok(self.shared.log.len()?)
    }

    pub fn pending_operations(&self) -> Result<Vec<QueuedOperation>> {
        Ok(self.shared.log.list()?)
    }

    pub fn reconnect_state(&self) -> ReconnectState {
        self.shared.reconnect.state()
    }

    /// Probes now and applies the result.
    pub async fn probe(&self) -> ConnectivityStatus {
        let status = self.shared.probe.probe().await;
        self.shared.observe(status, Origin::Monitor).await;
        status
    }

    /// Cancels the reconnection schedule and checks the server right away.
    ///
    /// On success reconciles and returns true, announcing the reconnection
    /// only if the server had been unavailable. Otherwise the schedule is
    /// re-armed and false is returned.
    pub async fn manual_reconnect(&self) -> bool {
        let shared = &self.shared;
        shared.reconnect.stop();

        let status = shared.probe.probe().await;
        let recovered = shared.record(status, Origin::Manual);
        if !status.is_server_available() {
            tracing::info!(%status, "manual reconnect failed");
            return false;
        }

        if recovered {
            tracing::info!("manual reconnect succeeded");
            shared.reconnected.publish(&Reconnected { manual: true });
        }
        if let Err(e) = shared.reconcile().await {
            tracing::warn!(error = %e, "reconciliation failed");
        }
        true
    }

    /// Replays the operation log if the server is reachable.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        self.shared.reconcile().await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<CourseView>> {
        self.shared.list(query).await
    }

    pub async fn add(&self, record: Fields) -> Result<CourseView> {
        self.shared.add(record).await
    }

    pub async fn update(&self, id: RecordId, patch: Fields) -> Result<CourseView> {
        self.shared.update(id, patch).await
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        self.shared.delete(id).await
    }
}

impl Drop for OfflineEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_monitor(shared: Weak<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let Some(shared) = shared.upgrade() else { return };
        let status = shared.probe.probe().await;
        shared.observe(status, Origin::Monitor).await;
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
