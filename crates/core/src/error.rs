// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sb-core operations.

use thiserror::Error;

/// All possible errors that can occur in sb-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid stamp: {0}")]
    InvalidStamp(String),

    #[error("invalid record id: '{0}'\n  hint: use a server id (e.g. 42) or a local placeholder (e.g. local:1700000000000-0)")]
    InvalidRecordId(String),

    #[error("course record must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sb-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
