// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use sb_core::course::fields_from_value;
use sb_core::{
    ConnectivityStatus, Course, Fields, LocalId, MemoryStore, Mutation, QueuedOperation, RecordId,
    ServerId, Stamp,
};

use super::cache::LocalCache;
use super::engine::{EngineConfig, OfflineEngine};
use super::network::NetworkFlag;
use super::queue::OperationLog;
use super::transport_tests::MockBackend;

/// Build a field map from a JSON object literal.
pub fn fields(value: Value) -> Fields {
    fields_from_value(value).unwrap()
}

/// Placeholder id with the given counter.
pub fn local(n: u32) -> LocalId {
    LocalId(Stamp::new(1_000, n))
}

pub fn server(n: u64) -> RecordId {
    RecordId::Server(ServerId(n))
}

/// Queued add of a course titled `title`, stamped `seq`.
pub fn add_op(seq: u32, title: &str) -> QueuedOperation {
    QueuedOperation::new(
        Stamp::new(1_000, seq),
        Mutation::Add { placeholder: local(seq), record: fields(json!({ "title": title })) },
    )
}

/// Queued update of `target`, stamped `seq`.
pub fn update_op(seq: u32, target: RecordId, patch: Value) -> QueuedOperation {
    QueuedOperation::new(Stamp::new(1_000, seq), Mutation::Update { target, patch: fields(patch) })
}

/// Queued delete of `target`, stamped `seq`.
pub fn delete_op(seq: u32, target: RecordId) -> QueuedOperation {
    QueuedOperation::new(Stamp::new(1_000, seq), Mutation::Delete { target })
}

/// Callback that records every event it sees, plus the shared log.
pub fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |event: &T| sink.lock().unwrap().push(event.clone()))
}

/// An engine wired to a mock server and an in-memory store.
pub struct Harness {
    pub mock: MockBackend,
    pub network: NetworkFlag,
    pub store: Arc<MemoryStore>,
    pub engine: OfflineEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Builds an engine over `store`, which may already hold state.
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let mock = MockBackend::new();
        let network = NetworkFlag::default();
        let engine = OfflineEngine::new(
            Arc::new(mock.clone()),
            Arc::new(network.clone()),
            store.clone(),
            EngineConfig::default(),
        )
        .unwrap();
        Harness { mock, network, store, engine }
    }

    /// Probes with the network down.
    pub async fn go_offline(&self) {
        self.network.set(false);
        assert_eq!(self.engine.probe().await, ConnectivityStatus::OFFLINE);
    }

    /// Probes with the network and server up, reconciling if needed.
    pub async fn go_online(&self) {
        self.network.set(true);
        self.mock.set_unreachable(false);
        assert!(self.engine.probe().await.is_server_available());
    }

    /// Records held in the local cache.
    pub fn cached(&self) -> Vec<Course> {
        LocalCache::new(self.store.clone()).load().unwrap()
    }

    pub fn pending(&self) -> Vec<QueuedOperation> {
        OperationLog::new(self.store.clone()).list().unwrap()
    }
}
