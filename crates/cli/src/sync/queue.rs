// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operation log for mutations made while the server is unreachable.
//!
//! Operations are appended in enqueue order to a durable store, one JSON
//! line per operation. They leave the log only once reconciliation has
//! confirmed them; everything else stays for the next pass.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use sb_core::store::{self, DurableStore};
use sb_core::{LocalId, Mutation, OpId, QueuedOperation, RecordId, ServerId, Stamp};

/// Well-known storage key of the operation log.
pub const OP_LOG_KEY: &str = "pending-ops";

/// Well-known storage key of the placeholder → server id assignments.
pub const ID_MAP_KEY: &str = "confirmed-ids";

/// One confirmed placeholder, as stored under [`ID_MAP_KEY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ConfirmedId {
    local: LocalId,
    server: ServerId,
}

/// Error type for operation log access.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The store refused or failed the read or write.
    #[error("operation log unavailable: {0}")]
    Persist(#[from] sb_core::Error),
}

impl QueueError {
    /// Returns true if the store ran out of space.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            QueueError::Persist(sb_core::Error::Store(sb_core::StoreError::QuotaExceeded { .. }))
        )
    }
}

/// Result type for operation log access.
pub type QueueResult<T> = Result<T, QueueError>;

/// Durable, ordered log of pending operations.
///
/// Every write goes through one lock so an append can never interleave
/// with the read-modify-write at the end of a reconciliation pass.
pub struct OperationLog {
    store: Arc<dyn DurableStore>,
    write_lock: Mutex<()>,
}

impl OperationLog {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        OperationLog { store, write_lock: Mutex::new(()) }
    }

    /// Persists an operation at the end of the log.
    ///
    /// An error means the operation was NOT recorded; the caller must tell
    /// the user rather than carry on as if the change were saved.
    pub fn append(&self, op: &QueuedOperation) -> QueueResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        store::append(self.store.as_ref(), OP_LOG_KEY, op)?;
        Ok(())
    }

    /// Returns all pending operations in enqueue order.
    pub fn list(&self) -> QueueResult<Vec<QueuedOperation>> {
        Ok(store::read_all(self.store.as_ref(), OP_LOG_KEY)?)
    }

    /// Removes every operation.
    ///
    /// Call this only after a reconciliation pass settled everything.
    pub fn clear(&self) -> QueueResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write(&[])
    }

    /// Atomically replaces the log with `ops`.
    pub fn replace_with(&self, ops: &[QueuedOperation]) -> QueueResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write(ops)
    }

    /// Drops the settled operations and points survivors at the server ids
    /// learned during the pass.
    ///
    /// Works on the log as it is now, not on the snapshot the pass started
    /// from, so operations appended mid-pass are kept. Returns how many
    /// operations remain.
    pub fn settle(&self, settled: &HashSet<OpId>, remap: &HashMap<LocalId, ServerId>) -> QueueResult<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut remaining: Vec<QueuedOperation> =
            self.list()?.into_iter().filter(|op| !settled.contains(&op.id)).collect();
        for op in &mut remaining {
            for (local, server) in remap {
                op.remap_target(*local, *server);
            }
        }

        self.write(&remaining)?;
        Ok(remaining.len())
    }

    /// Persists placeholder assignments learned from the server.
    ///
    /// Must happen before [`OperationLog::settle`] drops the adds, so a
    /// placeholder is never forgotten while something may still name it.
    pub fn confirm_ids(&self, remap: &HashMap<LocalId, ServerId>) -> QueueResult<()> {
        if remap.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<ConfirmedId> =
            remap.iter().map(|(local, server)| ConfirmedId { local: *local, server: *server }).collect();
        entries.sort_by_key(|entry| entry.local);
        for entry in &entries {
            store::append(self.store.as_ref(), ID_MAP_KEY, entry)?;
        }
        Ok(())
    }

    /// Every placeholder assignment persisted so far.
    pub fn confirmed_ids(&self) -> QueueResult<HashMap<LocalId, ServerId>> {
        let entries: Vec<ConfirmedId> = store::read_all(self.store.as_ref(), ID_MAP_KEY)?;
        Ok(entries.into_iter().map(|entry| (entry.local, entry.server)).collect())
    }

    /// Returns true if a queued add creates the record behind `placeholder`.
    pub fn creates(&self, placeholder: LocalId) -> QueueResult<bool> {
        Ok(self.list()?.iter().any(|op| {
            matches!(op.mutation, Mutation::Add { placeholder: p, .. } if p == placeholder)
        }))
    }

    /// Get the number of queued operations.
    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.list()?.len())
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns true if any queued operation targets `id`.
    pub fn has_pending_for(&self, id: RecordId) -> QueueResult<bool> {
        Ok(self.list()?.iter().any(|op| op.touches(id)))
    }

    /// Returns the newest stamp in the log, if any.
    pub fn newest_stamp(&self) -> QueueResult<Option<Stamp>> {
        Ok(self.list()?.iter().map(|op| op.id).max())
    }

    fn write(&self, ops: &[QueuedOperation]) -> QueueResult<()> {
        store::write_all(self.store.as_ref(), OP_LOG_KEY, ops)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
