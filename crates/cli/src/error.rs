// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use sb_core::RecordId;

use crate::sync::queue::QueueError;
use crate::sync::transport::TransportError;

/// All possible errors that can occur in the sbrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'sb init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid server URL '{0}'\n  hint: use an http:// or https:// URL, e.g. http://localhost:3000")]
    InvalidUrl(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("course not found: {0}")]
    NotFound(RecordId),

    /// The change could not be written to the pending-operation log and
    /// was NOT recorded.
    #[error("change not saved: {0}")]
    Storage(#[from] QueueError),

    #[error("local cache error: {0}")]
    Cache(#[from] sb_core::Error),

    #[error("server rejected the request ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("server error: {0}")]
    Transport(TransportError),

    #[error("server unreachable\n  hint: {pending} change(s) remain queued; run 'sb reconnect' once the server is back")]
    ServerUnavailable { pending: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sbrs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Status { code, message } => Error::Rejected { code, message },
            other => Error::Transport(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
