// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Platform network signal.
//!
//! The probe consults this flag before touching the server: with no
//! network there is nothing to probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reports whether the platform believes the network is up.
pub trait NetworkSignal: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A settable network flag shared between the engine and whatever watches
/// the platform's connectivity.
#[derive(Debug, Clone)]
pub struct NetworkFlag {
    online: Arc<AtomicBool>,
}

impl NetworkFlag {
    pub fn new(online: bool) -> Self {
        NetworkFlag { online: Arc::new(AtomicBool::new(online)) }
    }

    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl Default for NetworkFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkSignal for NetworkFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}
