// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline engine for the course catalog.
//!
//! Keeps the client usable while the catalog server is unreachable and
//! catches the server up once it is back.
//!
//! # Architecture
//!
//! ```text
//!   UI ──► ┌──────────┐  online  ┌───────────┐
//!          │ Gateway  │─────────►│  Backend  │◄──┐
//!          └──────────┘          │  (trait)  │   │
//!            │ offline           └───────────┘   │
//!            ▼                         ▲         │
//!          ┌──────────┐  replay  ┌───────────┐   │
//!          │   Log    │─────────►│ Reconcile │   │
//!          └──────────┘          └───────────┘   │
//!                                      ▲         │
//!          ┌──────────┐  down    ┌───────────┐   │
//!          │  Probe   │─────────►│ Reconnect │───┘
//!          └──────────┘          └───────────┘
//!               │
//!               ▼
//!          ┌──────────┐
//!          │Broadcast │  (status, data changed, sync complete)
//!          └──────────┘
//! ```
//!
//! # Features
//!
//! - Probe with per-endpoint timeout, shared in-flight result and watchdog
//! - Constant-interval reconnection with an explicit session state machine
//! - Durable JSONL operation log replayed in enqueue order
//! - Placeholder ids remapped to server ids within and across passes
//! - Panic-isolated, synchronous fan-out of engine events
//! - Injectable backend, network signal, store and clock for testing

mod broadcast;
mod cache;
mod engine;
mod gateway;
mod network;
mod probe;
pub(crate) mod queue;
mod reconcile;
mod reconnect;
pub(crate) mod transport;

pub use broadcast::{Hub, StatusBroadcaster, Subscription};
pub use cache::{project, CachePatch, LocalCache};
pub use engine::{EngineConfig, OfflineEngine};
pub use gateway::ListQuery;
pub use network::{NetworkFlag, NetworkSignal};
pub use probe::{ConnectivityProbe, ProbeConfig};
pub use queue::{OperationLog, QueueError};
pub use reconcile::{replay, IdRemap, Pass, ReconcileOutcome, Reconciler, Replay};
pub use reconnect::{Prober, ReconnectController, ReconnectSession, ReconnectState};
pub use transport::{Backend, HttpBackend, TransportError, TransportFuture, TransportResult};

#[cfg(test)]
pub(crate) mod test_helpers;
