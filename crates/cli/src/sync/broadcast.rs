// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out notification hubs.
//!
//! Delivery is synchronous and in registration order. A subscriber that
//! panics is logged and skipped; the remaining subscribers still receive
//! the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use sb_core::ConnectivityStatus;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Callback<T>)>,
}

/// A typed publish/subscribe hub.
pub struct Hub<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Hub<T> {
    pub fn new() -> Self {
        Hub { registry: Arc::new(Mutex::new(Registry { next_id: 0, listeners: Vec::new() })) }
    }

    /// Registers a callback for every subsequent event.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
                    registry.listeners.retain(|(listener_id, _)| *listener_id != id);
                }
            })),
        }
    }

    /// Delivers `event` to every subscriber. Returns how many subscribers
    /// handled it without panicking.
    pub fn publish(&self, event: &T) -> usize {
        deliver(&self.snapshot(), event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().unwrap_or_else(|e| e.into_inner()).listeners.len()
    }

    fn snapshot(&self) -> Vec<Callback<T>> {
        let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }
}

impl<T: 'static> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Calls each listener outside of any lock so callbacks may subscribe or
/// unsubscribe freely.
fn deliver<T>(listeners: &[Callback<T>], event: &T) -> usize {
    let mut delivered = 0;
    for listener in listeners {
        match catch_unwind(AssertUnwindSafe(|| listener(event))) {
            Ok(()) => delivered += 1,
            Err(_) => tracing::warn!("subscriber panicked while handling an event; skipping it"),
        }
    }
    delivered
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to end it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Stops delivery to this subscriber. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

/// Connectivity status hub that remembers the last recorded status.
///
/// New subscribers are called with the current status straight away, so
/// nobody has to race the first change to learn where things stand.
/// Deliveries are serialized: every subscriber sees statuses in the order
/// they were recorded, and the last one it sees is the current one.
/// Callbacks must not subscribe to or update the same broadcaster.
pub struct StatusBroadcaster {
    current: Mutex<ConnectivityStatus>,
    delivering: Mutex<()>,
    hub: Hub<ConnectivityStatus>,
}

impl StatusBroadcaster {
    pub fn new(initial: ConnectivityStatus) -> Self {
        StatusBroadcaster { current: Mutex::new(initial), delivering: Mutex::new(()), hub: Hub::new() }
    }

    pub fn current(&self) -> ConnectivityStatus {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&ConnectivityStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let _delivering = self.delivering.lock().unwrap_or_else(|e| e.into_inner());
        let callback: Callback<ConnectivityStatus> = Arc::new(callback);
        let cb = Arc::clone(&callback);
        let subscription = self.hub.subscribe(move |status| cb(status));
        deliver(&[callback], &self.current());
        subscription
    }

    /// Records a freshly probed status and notifies subscribers if it
    /// differs from the previous one. Returns the previous status.
    pub fn update(&self, status: ConnectivityStatus) -> ConnectivityStatus {
        let _delivering = self.delivering.lock().unwrap_or_else(|e| e.into_inner());
        let previous = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *current, status)
        };
        if previous == status {
            return previous;
        }

        tracing::info!(%previous, current = %status, "connectivity changed");
        self.hub.publish(&status);
        previous
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
