// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of the operation log against the server.
//!
//! A pass replays a snapshot of the log strictly in enqueue order. Each
//! operation gets an [`Outcome`]; settled ones leave the log, the rest
//! stay with their targets rewritten to any server ids learned during the
//! pass. Only one pass runs at a time.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sb_core::course::without_id;
use sb_core::{
    LocalId, Mutation, OpId, OperationResult, Outcome, QueuedOperation, RecordId, ServerId,
    SyncReport,
};

use super::cache::{CachePatch, LocalCache};
use super::queue::{OperationLog, QueueResult};
use super::transport::{Backend, TransportError};

/// Placeholder → server id assignments learned while replaying.
pub type IdRemap = HashMap<LocalId, ServerId>;

/// What a call to reconcile amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// A pass ran (possibly over an empty log).
    Completed(SyncReport),
    /// Another pass was already running.
    Busy,
    /// The network or the server is down.
    Unavailable,
}

/// Everything a replay learned, before anything is written back.
#[derive(Debug, Default)]
pub struct Replay {
    pub results: Vec<OperationResult>,
    pub remap: IdRemap,
    pub patches: Vec<CachePatch>,
    pub settled: HashSet<OpId>,
    /// True if any call failed in a way that says the server is gone.
    pub server_unreachable: bool,
}

impl Replay {
    fn record(&mut self, op: &QueuedOperation, target: RecordId, outcome: Outcome) {
        if outcome.is_settled() {
            self.settled.insert(op.id);
        }
        self.results.push(OperationResult { op_id: op.id, kind: op.kind(), target, outcome });
    }

    fn resolve(&self, target: RecordId) -> Option<ServerId> {
        match target {
            RecordId::Server(id) => Some(id),
            RecordId::Local(local) => self.remap.get(&local).copied(),
        }
    }

    fn failed(&mut self, op: &QueuedOperation, target: RecordId, error: &TransportError) {
        if error.is_recoverable() {
            self.server_unreachable = true;
        }
        tracing::warn!(op = %op.id, kind = %op.kind(), %target, %error, "queued operation failed");
        self.record(op, target, Outcome::Failed { reason: error.to_string() });
    }
}

/// Replays `ops` in order against `backend`.
///
/// Nothing is persisted here; the caller applies the cache patches and
/// settles the log.
pub async fn replay(backend: &dyn Backend, ops: &[QueuedOperation]) -> Replay {
    let mut pass = Replay::default();
    let created: HashSet<LocalId> = ops
        .iter()
        .filter_map(|op| match op.mutation {
            Mutation::Add { placeholder, .. } => Some(placeholder),
            _ => None,
        })
        .collect();

    for op in ops {
        let target = op.target();
        match &op.mutation {
            Mutation::Add { placeholder, record } => {
                match backend.create(without_id(record.clone())).await {
                    Ok(course) => {
                        tracing::debug!(%placeholder, id = %course.id, "placeholder confirmed");
                        pass.remap.insert(*placeholder, course.id);
                        let server_id = Some(course.id);
                        pass.patches.push(CachePatch::Upsert(course));
                        pass.record(op, target, Outcome::Applied { server_id });
                    }
                    Err(e) => pass.failed(op, target, &e),
                }
            }
            Mutation::Update { patch, .. } => {
                let Some(id) = pass.resolve(target) else {
                    pass.record(op, target, unresolved(target, &created));
                    continue;
                };
                match backend.update(id, without_id(patch.clone())).await {
                    Ok(echoed) => {
                        pass.patches.push(CachePatch::Merge(id, patch.clone()));
                        if let Some(course) = echoed {
                            pass.patches.push(CachePatch::Upsert(course));
                        }
                        pass.record(op, target, Outcome::Applied { server_id: Some(id) });
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::info!(%id, "update target no longer exists; dropping update");
                        pass.patches.push(CachePatch::Remove(id));
                        pass.record(op, target, Outcome::Skipped { reason: format!("record {id} not found") });
                    }
                    Err(e) => pass.failed(op, target, &e),
                }
            }
            Mutation::Delete { .. } => {
                let Some(id) = pass.resolve(target) else {
                    pass.record(op, target, unresolved(target, &created));
                    continue;
                };
                match backend.delete(id).await {
                    Ok(()) => {
                        pass.patches.push(CachePatch::Remove(id));
                        pass.record(op, target, Outcome::Applied { server_id: Some(id) });
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(%id, "delete target already gone");
                        pass.patches.push(CachePatch::Remove(id));
                        pass.record(op, target, Outcome::Applied { server_id: Some(id) });
                    }
                    Err(e) => pass.failed(op, target, &e),
                }
            }
        }
    }

    pass
}

/// Outcome for an operation whose placeholder target has no server id.
///
/// Waits while the add that creates the record is still queued; with no
/// such add the record can never exist and the operation is dropped.
fn unresolved(target: RecordId, created: &HashSet<LocalId>) -> Outcome {
    match target {
        RecordId::Local(local) if !created.contains(&local) => {
            tracing::info!(%target, "operation targets a record that was never created; dropping it");
            Outcome::Skipped { reason: format!("{target} was never created") }
        }
        _ => Outcome::Deferred { reason: format!("creation of {target} is not confirmed") },
    }
}

/// Held for the duration of a pass; releases the slot when dropped.
pub struct PassGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    pub fn try_acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard { running })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// A finished pass.
#[derive(Debug)]
pub struct Pass {
    pub report: SyncReport,
    pub remap: IdRemap,
    pub server_unreachable: bool,
    /// Operations left in the log afterwards.
    pub remaining: usize,
}

/// Runs passes over a log and keeps the cache in step with the outcomes.
pub struct Reconciler {
    backend: Arc<dyn Backend>,
    log: Arc<OperationLog>,
    cache: Arc<LocalCache>,
    running: AtomicBool,
}

impl Reconciler {
    pub fn new(backend: Arc<dyn Backend>, log: Arc<OperationLog>, cache: Arc<LocalCache>) -> Self {
        Reconciler { backend, log, cache, running: AtomicBool::new(false) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one pass. Returns `None` if a pass is already running.
    ///
    /// Fails only if the log cannot be read or rewritten. A failed cache
    /// write is logged and does not fail the pass.
    pub async fn run(&self) -> QueueResult<Option<Pass>> {
        let Some(_guard) = PassGuard::try_acquire(&self.running) else {
            tracing::debug!("reconciliation already running");
            return Ok(None);
        };

        let ops = self.log.list()?;
        if ops.is_empty() {
            return Ok(Some(Pass {
                report: SyncReport::from_results(Vec::new()),
                remap: IdRemap::new(),
                server_unreachable: false,
                remaining: 0,
            }));
        }

        tracing::info!(pending = ops.len(), "reconciling queued operations");
        let replay = replay(self.backend.as_ref(), &ops).await;

        if let Err(e) = self.cache.apply(&replay.patches) {
            tracing::warn!(error = %e, "failed to update local cache after reconciliation");
        }
        self.log.confirm_ids(&replay.remap)?;
        let remaining = self.log.settle(&replay.settled, &replay.remap)?;

        let report = SyncReport::from_results(replay.results);
        tracing::info!(
            settled = report.settled_count(),
            pending = report.pending_count(),
            remaining,
            success = report.success,
            "reconciliation pass finished"
        );

        Ok(Some(Pass {
            report,
            remap: replay.remap,
            server_unreachable: replay.server_unreachable,
            remaining,
        }))
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
