// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the network and the catalog server are reachable.
///
/// The server can only be reachable when the network is, so the single
/// constructor folds `is_server_available` into `is_online`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawStatus")]
pub struct ConnectivityStatus {
    is_online: bool,
    is_server_available: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    is_online: bool,
    is_server_available: bool,
}

impl From<RawStatus> for ConnectivityStatus {
    fn from(raw: RawStatus) -> Self {
        ConnectivityStatus::new(raw.is_online, raw.is_server_available)
    }
}

impl ConnectivityStatus {
    pub const OFFLINE: ConnectivityStatus =
        ConnectivityStatus { is_online: false, is_server_available: false };

    pub fn new(is_online: bool, is_server_available: bool) -> Self {
        ConnectivityStatus { is_online, is_server_available: is_online && is_server_available }
    }

    /// Network up, server unreachable.
    pub fn server_down() -> Self {
        ConnectivityStatus::new(true, false)
    }

    /// Network and server both reachable.
    pub fn available() -> Self {
        ConnectivityStatus::new(true, true)
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn is_server_available(&self) -> bool {
        self.is_server_available
    }
}

impl Default for ConnectivityStatus {
    fn default() -> Self {
        ConnectivityStatus::OFFLINE
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_online, self.is_server_available) {
            (false, _) => write!(f, "offline"),
            (true, false) => write!(f, "server unreachable"),
            (true, true) => write!(f, "online"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
