// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::network::NetworkFlag;
use crate::sync::test_helpers::{add_op, fields, recorder, server, update_op, Harness};
use crate::sync::transport_tests::{Health, MockBackend};
use sb_core::{ClockSource, MemoryStore, Outcome, Stamp};
use serde_json::json;

fn seeded_store(ops: &[QueuedOperation]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let log = OperationLog::new(store.clone());
    for op in ops {
        log.append(op).unwrap();
    }
    store
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn server_is_unconfirmed_until_first_probe() {
    let h = Harness::new();
    assert_eq!(h.engine.status(), ConnectivityStatus::server_down());
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
}

#[tokio::test]
async fn start_reconciles_log_left_by_previous_run() {
    let h = Harness::with_store(seeded_store(&[add_op(1, "Leftover")]));
    let (reports, sink) = recorder();
    h.engine.on_sync_complete(sink);

    let status = h.engine.start().await;

    assert!(status.is_server_available());
    assert_eq!(h.engine.pending_operation_count().unwrap(), 0);
    assert_eq!(h.mock.records().len(), 1);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].success);
    h.engine.stop();
}

#[tokio::test(start_paused = true)]
async fn monitor_probes_on_its_interval() {
    let h = Harness::new();
    h.engine.start().await;
    assert_eq!(h.mock.health_calls(), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(h.mock.health_calls(), 3);

    h.engine.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.mock.health_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn monitor_notices_server_outage() {
    let h = Harness::new();
    h.engine.start().await;
    let (statuses, sink) = recorder();
    h.engine.subscribe(sink);

    h.mock.set_unreachable(true);
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(h.engine.status(), ConnectivityStatus::server_down());
    assert_eq!(
        *statuses.lock().unwrap(),
        vec![ConnectivityStatus::available(), ConnectivityStatus::server_down()]
    );
    assert!(h.engine.reconnect_state() != ReconnectState::Idle);
    h.engine.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_cancels_reconnection() {
    let h = Harness::new();
    h.mock.set_unreachable(true);
    h.engine.start().await;
    assert!(h.engine.reconnect_state() != ReconnectState::Idle);

    h.engine.stop();
    h.engine.stop();

    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
    let calls = h.mock.health_calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.mock.health_calls(), calls);
}

#[tokio::test]
async fn restart_never_reuses_persisted_stamps() {
    struct Frozen;
    impl ClockSource for Frozen {
        fn now_ms(&self) -> u64 {
            1_000
        }
    }

    let store = seeded_store(&[add_op(5, "Queued earlier")]);
    let engine = OfflineEngine::with_clock(
        Arc::new(MockBackend::new()),
        Arc::new(NetworkFlag::new(false)),
        store,
        EngineConfig::default(),
        StampClock::with_clock(Frozen),
    )
    .unwrap();
    engine.probe().await;

    let view = engine.add(fields(json!({ "title": "New" }))).await.unwrap();

    assert_eq!(view.id, RecordId::Local(sb_core::LocalId(Stamp::new(1_000, 6))));
}

// =============================================================================
// Status broadcasting
// =============================================================================

#[tokio::test]
async fn subscriber_follows_connectivity_changes() {
    let h = Harness::new();
    let (statuses, sink) = recorder();
    let mut subscription = h.engine.subscribe(sink);

    h.go_online().await;
    h.go_offline().await;
    h.go_offline().await;
    subscription.unsubscribe();
    h.go_online().await;

    assert_eq!(
        *statuses.lock().unwrap(),
        vec![
            ConnectivityStatus::server_down(),
            ConnectivityStatus::available(),
            ConnectivityStatus::OFFLINE,
        ]
    );
}

#[tokio::test]
async fn offline_never_reports_server_available() {
    let h = Harness::new();
    let (statuses, sink) = recorder();
    h.engine.subscribe(sink);

    h.go_offline().await;
    h.go_online().await;
    h.network.set(false);
    h.engine.probe().await;

    for status in statuses.lock().unwrap().iter() {
        assert!(status.is_online() || !status.is_server_available());
    }
}

// =============================================================================
// Reconnection
// =============================================================================

#[tokio::test(start_paused = true)]
async fn hanging_health_check_drives_reconnection_cadence() {
    let h = Harness::new();
    h.mock.set_health("/health", Health::Hang);
    let (reconnected, sink) = recorder();
    h.engine.on_reconnected(sink);

    let started = tokio::time::Instant::now();
    let status = h.engine.probe().await;

    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(status, ConnectivityStatus::server_down());
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Probing { attempt: 0 });

    // Reconnection checks at 2s (immediately) and 7s, each timing out.
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert_eq!(h.mock.health_calls(), 3);
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Probing { attempt: 1 });

    h.mock.set_health("/health", Health::Ok);
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.engine.status(), ConnectivityStatus::available());
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
    assert_eq!(*reconnected.lock().unwrap(), vec![Reconnected { manual: false }]);
}

#[tokio::test(start_paused = true)]
async fn recovery_replays_queued_changes() {
    let h = Harness::new();
    h.mock.set_unreachable(true);
    h.engine.probe().await;
    h.engine.add(fields(json!({ "title": "Queued" }))).await.unwrap();
    let (reports, sink) = recorder();
    h.engine.on_sync_complete(sink);

    h.mock.set_unreachable(false);
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(h.engine.pending_operation_count().unwrap(), 0);
    assert_eq!(h.mock.records().len(), 1);
    assert_eq!(reports.lock().unwrap().len(), 1);
    h.engine.stop();
}

#[tokio::test(start_paused = true)]
async fn manual_reconnect_success_announces_and_reconciles() {
    let h = Harness::new();
    h.mock.set_unreachable(true);
    h.engine.probe().await;
    h.engine.add(fields(json!({ "title": "Queued" }))).await.unwrap();
    let (reconnected, sink) = recorder();
    h.engine.on_reconnected(sink);

    h.mock.set_unreachable(false);
    assert!(h.engine.manual_reconnect().await);

    assert_eq!(*reconnected.lock().unwrap(), vec![Reconnected { manual: true }]);
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
    assert_eq!(h.engine.pending_operation_count().unwrap(), 0);
}

#[tokio::test]
async fn manual_reconnect_while_available_announces_nothing() {
    let h = Harness::new();
    h.go_online().await;
    let (reconnected, sink) = recorder::<Reconnected>();
    h.engine.on_reconnected(sink);

    assert!(h.engine.manual_reconnect().await);

    assert!(reconnected.lock().unwrap().is_empty());
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
}

#[tokio::test(start_paused = true)]
async fn manual_reconnect_failure_rearms_schedule() {
    let h = Harness::new();
    h.mock.set_unreachable(true);
    h.engine.probe().await;

    assert!(!h.engine.manual_reconnect().await);

    assert!(matches!(h.engine.reconnect_state(), ReconnectState::Probing { .. }));
    assert_eq!(h.engine.status(), ConnectivityStatus::server_down());
    h.engine.stop();
}

#[tokio::test]
async fn manual_reconnect_without_network_fails_fast() {
    let h = Harness::new();
    h.network.set(false);

    assert!(!h.engine.manual_reconnect().await);

    assert!(h.mock.calls().is_empty());
    assert_eq!(h.engine.reconnect_state(), ReconnectState::Idle);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn reconcile_requires_server() {
    let h = Harness::new();
    h.go_offline().await;
    assert_eq!(h.engine.reconcile().await.unwrap(), ReconcileOutcome::Unavailable);
}

#[tokio::test]
async fn empty_log_reconciles_silently() {
    let h = Harness::new();
    h.go_online().await;
    let (reports, sink) = recorder();
    h.engine.on_sync_complete(sink);

    let outcome = h.engine.reconcile().await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Completed(SyncReport { success: true, results: Vec::new() }));
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn overlapping_reconciles_apply_once() {
    let h = Harness::new();
    h.go_online().await;
    h.go_offline().await;
    h.engine.add(fields(json!({ "title": "Once" }))).await.unwrap();
    h.network.set(true);
    // Mark the server reachable without triggering the automatic pass.
    h.engine.shared.status.update(ConnectivityStatus::available());
    h.mock.set_delay(Duration::from_millis(100));

    let (a, b) = tokio::join!(h.engine.reconcile(), h.engine.reconcile());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| **o == ReconcileOutcome::Busy).count(), 1);
    assert_eq!(h.mock.records().len(), 1);
}

#[tokio::test]
async fn partial_failure_is_reported_and_retained() {
    let h = Harness::with_store(seeded_store(&[
        update_op(1, server(7), json!({ "title": "Rejected" })),
        add_op(2, "Accepted"),
    ]));
    h.mock.insert(7, "Optics");
    h.mock.reject_updates(7, 422);
    let (reports, sink) = recorder();
    h.engine.on_sync_complete(sink);

    h.go_online().await;

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].success);
    assert!(matches!(reports[0].results[0].outcome, Outcome::Failed { .. }));
    assert!(matches!(reports[0].results[1].outcome, Outcome::Applied { .. }));
    assert_eq!(h.engine.pending_operation_count().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn monitor_retries_backlog_while_server_stays_up() {
    let h = Harness::with_store(seeded_store(&[update_op(1, server(7), json!({ "title": "Rejected" }))]));
    h.mock.insert(7, "Optics");
    h.mock.reject_updates(7, 422);
    h.engine.start().await;
    assert_eq!(h.engine.pending_operation_count().unwrap(), 1);

    h.mock.accept_updates(7);
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(h.engine.pending_operation_count().unwrap(), 0);
    assert_eq!(h.mock.record(7).unwrap().title(), Some("Rejected"));
    h.engine.stop();
}

#[tokio::test]
async fn probe_with_empty_log_sends_nothing() {
    let h = Harness::new();
    h.go_online().await;

    h.engine.probe().await;

    assert!(h.mock.record_calls().is_empty());
}

#[tokio::test]
async fn offline_session_matches_online_result() {
    let offline = Harness::new();
    let online = Harness::new();
    for h in [&offline, &online] {
        h.mock.insert(1, "Algebra");
        h.mock.insert(2, "Biology");
        h.go_online().await;
        h.engine.list(&ListQuery::default()).await.unwrap();
    }

    offline.go_offline().await;
    for h in [&offline, &online] {
        let added = h.engine.add(fields(json!({ "title": "Chemistry" }))).await.unwrap();
        h.engine.update(server(1), fields(json!({ "credits": 5 }))).await.unwrap();
        h.engine.update(added.id, fields(json!({ "credits": 2 }))).await.unwrap();
        h.engine.delete(server(2)).await.unwrap();
    }
    offline.go_online().await;

    assert!(offline.pending().is_empty());
    assert_eq!(offline.cached(), online.cached());
    assert_eq!(offline.mock.records(), online.mock.records());
}
