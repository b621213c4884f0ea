// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the broadcast hubs.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn recorder() -> (Arc<Mutex<Vec<ConnectivityStatus>>>, impl Fn(&ConnectivityStatus) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |status: &ConnectivityStatus| sink.lock().unwrap().push(*status))
}

#[test]
fn hub_delivers_to_every_subscriber() {
    let hub: Hub<u32> = Hub::new();
    let count = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let count = Arc::clone(&count);
        let _ = hub.subscribe(move |n| {
            count.fetch_add(*n as usize, Ordering::SeqCst);
        });
    }

    assert_eq!(hub.publish(&2), 3);
    assert_eq!(count.load(Ordering::SeqCst), 6);
}

#[test]
fn hub_unsubscribe_stops_delivery() {
    let hub: Hub<u32> = Hub::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let mut sub = hub.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    hub.publish(&1);
    sub.unsubscribe();
    sub.unsubscribe();
    hub.publish(&1);

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn hub_dropping_handle_keeps_subscription() {
    let hub: Hub<u32> = Hub::new();
    drop(hub.subscribe(|_| {}));
    assert_eq!(hub.subscriber_count(), 1);
}

#[test]
fn hub_callback_may_subscribe_during_delivery() {
    let hub: Arc<Hub<u32>> = Arc::new(Hub::new());
    let inner = Arc::clone(&hub);
    let _ = hub.subscribe(move |_| {
        let _ = inner.subscribe(|_| {});
    });

    hub.publish(&1);
    assert_eq!(hub.subscriber_count(), 2);
}

#[test]
fn status_subscriber_receives_current_status_immediately() {
    let broadcaster = StatusBroadcaster::new(ConnectivityStatus::server_down());
    let (seen, callback) = recorder();

    let _ = broadcaster.subscribe(callback);

    assert_eq!(*seen.lock().unwrap(), vec![ConnectivityStatus::server_down()]);
}

#[test]
fn status_update_notifies_only_on_change() {
    let broadcaster = StatusBroadcaster::new(ConnectivityStatus::OFFLINE);
    let (seen, callback) = recorder();
    let _ = broadcaster.subscribe(callback);

    broadcaster.update(ConnectivityStatus::OFFLINE);
    let previous = broadcaster.update(ConnectivityStatus::available());
    broadcaster.update(ConnectivityStatus::available());

    assert_eq!(previous, ConnectivityStatus::OFFLINE);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![ConnectivityStatus::OFFLINE, ConnectivityStatus::available()]
    );
    assert_eq!(broadcaster.current(), ConnectivityStatus::available());
}

#[test]
fn panicking_subscriber_does_not_block_the_others() {
    let broadcaster = StatusBroadcaster::new(ConnectivityStatus::OFFLINE);
    let delivered = Arc::new(AtomicUsize::new(0));

    for i in 0..10 {
        let delivered = Arc::clone(&delivered);
        let _ = broadcaster.subscribe(move |status| {
            if i == 4 && status.is_server_available() {
                panic!("subscriber {i} failed");
            }
            if status.is_server_available() {
                delivered.fetch_add(1, Ordering::SeqCst);
            }
        });
    }

    broadcaster.update(ConnectivityStatus::available());

    assert_eq!(delivered.load(Ordering::SeqCst), 9);
    assert_eq!(broadcaster.subscriber_count(), 10);
}

#[test]
fn panicking_subscriber_is_isolated_on_initial_delivery() {
    let broadcaster = StatusBroadcaster::new(ConnectivityStatus::OFFLINE);
    let _ = broadcaster.subscribe(|_| panic!("bad subscriber"));
    let (seen, callback) = recorder();
    let _ = broadcaster.subscribe(callback);

    broadcaster.update(ConnectivityStatus::server_down());
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[test]
fn late_subscriber_ends_on_current_status_despite_concurrent_updates() {
    let broadcaster = Arc::new(StatusBroadcaster::new(ConnectivityStatus::OFFLINE));
    let updater = {
        let broadcaster = Arc::clone(&broadcaster);
        std::thread::spawn(move || {
            for i in 0..2_000 {
                let status = match i % 3 {
                    0 => ConnectivityStatus::available(),
                    1 => ConnectivityStatus::server_down(),
                    _ => ConnectivityStatus::OFFLINE,
                };
                broadcaster.update(status);
            }
        })
    };

    let mut subscribers = Vec::new();
    for _ in 0..200 {
        let (seen, callback) = recorder();
        let _ = broadcaster.subscribe(callback);
        subscribers.push(seen);
    }
    updater.join().unwrap();

    let current = broadcaster.current();
    for seen in subscribers {
        assert_eq!(seen.lock().unwrap().last().copied(), Some(current));
    }
}
