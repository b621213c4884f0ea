// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity probe.
//!
//! A probe first asks the platform whether the network is up, then GETs
//! the configured health endpoints in priority order until one answers.
//! Only one probe runs at a time: callers arriving while a probe is in
//! flight await that probe's result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use sb_core::ConnectivityStatus;

use super::network::NetworkSignal;
use super::transport::Backend;

/// Probe settings.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Health endpoints, highest priority first.
    pub endpoints: Vec<String>,
    /// Bound on each endpoint attempt.
    pub timeout: Duration,
    /// Age after which an unsettled in-flight probe is abandoned.
    pub watchdog: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            endpoints: vec!["/health".to_string()],
            timeout: Duration::from_secs(2),
            watchdog: Duration::from_secs(10),
        }
    }
}

struct InFlight {
    generation: u64,
    started: Instant,
    reachable: Shared<BoxFuture<'static, bool>>,
}

/// Determines network and server reachability.
pub struct ConnectivityProbe {
    backend: Arc<dyn Backend>,
    network: Arc<dyn NetworkSignal>,
    config: ProbeConfig,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

impl ConnectivityProbe {
    pub fn new(
        backend: Arc<dyn Backend>,
        network: Arc<dyn NetworkSignal>,
        config: ProbeConfig,
    ) -> Self {
        ConnectivityProbe {
            backend,
            network,
            config,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns true if the platform reports a network.
    pub fn network_online(&self) -> bool {
        self.network.is_online()
    }

    /// Returns true while a probe is running.
    pub fn is_probing(&self) -> bool {
        let in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.as_ref().is_some_and(|f| f.started.elapsed() < self.config.watchdog)
    }

    /// Number of server probes actually issued (joined callers excluded).
    pub fn probes_issued(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Probes the network and the server.
    pub async fn probe(&self) -> ConnectivityStatus {
        if !self.network.is_online() {
            return ConnectivityStatus::OFFLINE;
        }

        let (generation, reachable) = self.join_or_start();
        let server_available =
            tokio::time::timeout(self.config.watchdog, reachable).await.unwrap_or_else(|_| {
                tracing::warn!(
                    watchdog = ?self.config.watchdog,
                    "probe did not settle; treating server as unreachable"
                );
                false
            });

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if in_flight.as_ref().is_some_and(|f| f.generation == generation) {
                *in_flight = None;
            }
        }

        // The network may have dropped while we were waiting on the server.
        ConnectivityStatus::new(self.network.is_online(), server_available)
    }

    fn join_or_start(&self) -> (u64, Shared<BoxFuture<'static, bool>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

        match in_flight.as_ref() {
            Some(f) if f.started.elapsed() < self.config.watchdog => {
                tracing::debug!("joining in-flight probe");
                return (f.generation, f.reachable.clone());
            }
            Some(_) => tracing::warn!("releasing stuck probe after watchdog expiry"),
            None => {}
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let reachable = reach_any(
            Arc::clone(&self.backend),
            self.config.endpoints.clone(),
            self.config.timeout,
        )
        .boxed()
        .shared();
        *in_flight = Some(InFlight { generation, started: Instant::now(), reachable: reachable.clone() });
        (generation, reachable)
    }
}

/// Tries each endpoint in order; the first healthy answer wins.
async fn reach_any(backend: Arc<dyn Backend>, endpoints: Vec<String>, timeout: Duration) -> bool {
    for endpoint in endpoints {
        match tokio::time::timeout(timeout, backend.health(endpoint.clone())).await {
            Ok(Ok(())) => {
                tracing::debug!(%endpoint, "health check passed");
                return true;
            }
            Ok(Err(e)) => tracing::debug!(%endpoint, error = %e, "health check failed"),
            Err(_) => tracing::debug!(%endpoint, ?timeout, "health check timed out"),
        }
    }
    false
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
