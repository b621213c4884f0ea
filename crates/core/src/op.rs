// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutations awaiting server confirmation.
//!
//! Every write made while the server is unreachable becomes a
//! [`QueuedOperation`]. Operations are persisted in enqueue order and
//! replayed in that order once the server is back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::course::Fields;
use crate::id::{LocalId, RecordId, ServerId};
use crate::stamp::Stamp;

/// Unique identifier for a queued operation.
pub type OpId = Stamp;

/// A mutation waiting in the operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: OpId,
    pub enqueued_at: DateTime<Utc>,
    pub mutation: Mutation,
}

/// The change a queued operation makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// Create a record. `placeholder` stands in for the server id until
    /// the create is confirmed.
    Add { placeholder: LocalId, record: Fields },

    /// Apply a partial update.
    Update { target: RecordId, patch: Fields },

    /// Remove a record.
    Delete { target: RecordId },
}

/// Kind of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Add,
    Update,
    Delete,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Add => write!(f, "add"),
            OpKind::Update => write!(f, "update"),
            OpKind::Delete => write!(f, "delete"),
        }
    }
}

impl QueuedOperation {
    pub fn new(id: OpId, mutation: Mutation) -> Self {
        QueuedOperation { id, enqueued_at: Utc::now(), mutation }
    }

    pub fn kind(&self) -> OpKind {
        match self.mutation {
            Mutation::Add { .. } => OpKind::Add,
            Mutation::Update { .. } => OpKind::Update,
            Mutation::Delete { .. } => OpKind::Delete,
        }
    }

    /// Returns the record this operation refers to.
    ///
    /// For an add this is the placeholder.
    pub fn target(&self) -> RecordId {
        match &self.mutation {
            Mutation::Add { placeholder, .. } => RecordId::Local(*placeholder),
            Mutation::Update { target, .. } | Mutation::Delete { target } => *target,
        }
    }

    /// Returns true if this operation touches the given record.
    pub fn touches(&self, id: RecordId) -> bool {
        self.target() == id
    }

    /// Rewrites a placeholder target to the id the server issued for it.
    ///
    /// Adds are left alone: their placeholder names the record they create.
    /// Returns true if the target changed.
    pub fn remap_target(&mut self, local: LocalId, server: ServerId) -> bool {
        match &mut self.mutation {
            Mutation::Update { target, .. } | Mutation::Delete { target }
                if *target == RecordId::Local(local) =>
            {
                *target = RecordId::Server(server);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
