// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record identifiers.
//!
//! A course record is identified either by the id the server issued for it
//! or, while its creation is still queued, by a placeholder generated on this
//! client. The two never mix: a placeholder is a distinct variant rather than
//! a specially formatted server id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stamp::Stamp;

const LOCAL_PREFIX: &str = "local:";

/// Identifier issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u64);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder for a record created while the server was unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(pub Stamp);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LOCAL_PREFIX}{}", self.0)
    }
}

/// Identifier of a course record as seen by readers and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordId {
    Server(ServerId),
    Local(LocalId),
}

impl RecordId {
    /// Returns the server id, if this record has been confirmed.
    pub fn server(&self) -> Option<ServerId> {
        match self {
            RecordId::Server(id) => Some(*id),
            RecordId::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, RecordId::Local(_))
    }
}

impl From<ServerId> for RecordId {
    fn from(id: ServerId) -> Self {
        RecordId::Server(id)
    }
}

impl From<LocalId> for RecordId {
    fn from(id: LocalId) -> Self {
        RecordId::Local(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Server(id) => id.fmt(f),
            RecordId::Local(id) => id.fmt(f),
        }
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(stamp) = s.strip_prefix(LOCAL_PREFIX) {
            let stamp = stamp.parse::<Stamp>().map_err(|_| Error::InvalidRecordId(s.to_string()))?;
            return Ok(RecordId::Local(LocalId(stamp)));
        }
        s.parse::<u64>()
            .map(|n| RecordId::Server(ServerId(n)))
            .map_err(|_| Error::InvalidRecordId(s.to_string()))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
