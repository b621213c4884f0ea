// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod list;
pub mod pending;
pub mod status;
pub mod sync;
pub mod write;

use std::future::Future;
use std::sync::{Arc, Mutex};

use sb_core::{ConnectivityStatus, DataChanged, FileStore, SyncReport};

use crate::config::{find_work_dir, state_dir, Config};
use crate::display::{format_report_summary, format_unsettled};
use crate::error::{Error, Result};
use crate::sync::{HttpBackend, NetworkFlag, OfflineEngine, Subscription};

/// An engine opened for one command, plus what it announced while the
/// command ran.
pub struct Session {
    pub engine: OfflineEngine,
    pub server: String,
    reports: Arc<Mutex<Vec<SyncReport>>>,
    changes: Arc<Mutex<Vec<DataChanged>>>,
    _subscriptions: [Subscription; 2],
}

impl Session {
    pub fn new(engine: OfflineEngine, server: String) -> Self {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let changes = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&reports);
        let on_sync = engine.on_sync_complete(move |report: &SyncReport| {
            sink.lock().unwrap_or_else(|e| e.into_inner()).push(report.clone());
        });
        let sink = Arc::clone(&changes);
        let on_change = engine.on_data_changed(move |change: &DataChanged| {
            sink.lock().unwrap_or_else(|e| e.into_inner()).push(change.clone());
        });

        Session { engine, server, reports, changes, _subscriptions: [on_sync, on_change] }
    }

    /// Opens the engine over the work directory found from the current
    /// directory.
    pub fn open(offline: bool) -> Result<Self> {
        let work_dir = find_work_dir()?;
        let config = Config::load(&work_dir)?;

        let backend = HttpBackend::new(&config.server.url, &config.server.records_path, config.request_timeout())?;
        let store = FileStore::open(&state_dir(&work_dir)).map_err(sb_core::Error::from)?;
        let network = NetworkFlag::new(!offline);
        let engine =
            OfflineEngine::new(Arc::new(backend), Arc::new(network), Arc::new(store), config.engine_config())?;

        Ok(Session::new(engine, config.server.url))
    }

    /// Checks the server. If it answers, changes queued by earlier runs
    /// are replayed before this returns.
    pub async fn connect(&self) -> ConnectivityStatus {
        let status = self.engine.probe().await;
        tracing::debug!(%status, server = %self.server, "connected");
        status
    }

    /// Reconciliation reports published since the last call.
    pub fn take_reports(&self) -> Vec<SyncReport> {
        std::mem::take(&mut *self.reports.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// The most recent change announced by the engine.
    pub fn last_change(&self) -> Option<DataChanged> {
        self.changes.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }

    /// Prints a short notice for passes that ran as a side effect of
    /// connecting.
    pub fn warn_on_background_sync(&self) {
        for report in self.take_reports() {
            eprintln!("{}", format_report_summary(&report));
            for line in report.results.iter().filter_map(format_unsettled) {
                eprintln!("warning: {}", line);
            }
        }
    }
}

/// Runs a command future to completion on a single-threaded runtime.
pub fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    rt.block_on(future)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
