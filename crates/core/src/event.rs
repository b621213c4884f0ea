// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Events the engine broadcasts to the rest of the application.

use serde::{Deserialize, Serialize};

use crate::course::CourseView;
use crate::id::{RecordId, ServerId};
use crate::op::{OpId, OpKind};

/// Kind of change announced by a [`DataChanged`] event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Add,
    Update,
    Delete,
}

impl From<OpKind> for ChangeAction {
    fn from(kind: OpKind) -> Self {
        match kind {
            OpKind::Add => ChangeAction::Add,
            OpKind::Update => ChangeAction::Update,
            OpKind::Delete => ChangeAction::Delete,
        }
    }
}

/// What a change refers to: the record as it now reads, or just its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSubject {
    Record(CourseView),
    Id(RecordId),
}

/// A course record was added, changed or removed.
///
/// `confirmed` is false for changes that exist only in the local log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChanged {
    pub action: ChangeAction,
    pub subject: ChangeSubject,
    pub confirmed: bool,
}

/// Result of replaying one queued operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The server accepted the operation (or it had already taken effect).
    Applied { server_id: Option<ServerId> },
    /// The operation was dropped because its target no longer exists.
    Skipped { reason: String },
    /// The server rejected the operation; it stays queued.
    Failed { reason: String },
    /// The operation refers to a record whose creation is not confirmed
    /// yet; it stays queued and was not sent.
    Deferred { reason: String },
}

impl Outcome {
    /// Returns true if the operation leaves the log.
    pub fn is_settled(&self) -> bool {
        matches!(self, Outcome::Applied { .. } | Outcome::Skipped { .. })
    }
}

/// Per-operation entry of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub op_id: OpId,
    pub kind: OpKind,
    pub target: RecordId,
    pub outcome: Outcome,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    pub results: Vec<OperationResult>,
}

impl SyncReport {
    pub fn from_results(results: Vec<OperationResult>) -> Self {
        let success = results.iter().all(|r| r.outcome.is_settled());
        SyncReport { success, results }
    }

    pub fn settled_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_settled()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.results.len() - self.settled_count()
    }
}

/// The server became reachable again after an outage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconnected {
    /// True when recovery came from an explicit reconnect request.
    pub manual: bool,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
