// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mutation gateway: the read/write entry points of the engine.
//!
//! Every call picks a path. With the server reachable it goes over the
//! network and the cache is patched from the answer. Otherwise reads come
//! from the cache with queued operations overlaid, and writes are appended
//! to the operation log with an immediate, unconfirmed result.

use sb_core::course::without_id;
use sb_core::{
    ChangeAction, ChangeSubject, CourseView, DataChanged, Fields, LocalId, Mutation, QueuedOperation,
    RecordId, ServerId,
};

use super::cache::{project, CachePatch};
use super::engine::Shared;
use super::reconcile::ReconcileOutcome;
use super::transport::TransportError;
use crate::error::{Error, Result};

/// Filters for listing courses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring of the title.
    pub title_contains: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Query string parameters for the records endpoint.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.title_contains {
            params.push(("search".to_string(), search.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Applies the query to locally held views.
    pub fn apply(&self, views: Vec<CourseView>) -> Vec<CourseView> {
        let needle = self.title_contains.as_deref().map(str::to_lowercase);
        let matching = views.into_iter().filter(|view| match &needle {
            Some(needle) => view.title().is_some_and(|t| t.to_lowercase().contains(needle.as_str())),
            None => true,
        });
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    fn is_unfiltered(&self) -> bool {
        self.title_contains.is_none() && self.limit.is_none()
    }
}

/// What to do with a failed network call.
enum Fallback {
    Offline,
    Fail(Error),
}

impl Shared {
    fn server_reachable(&self) -> bool {
        self.status.current().is_server_available()
    }

    /// Returns the server id to write to over the network, or `None` if
    /// the write has to be queued behind earlier ones.
    fn network_target(&self, target: RecordId) -> Result<Option<ServerId>> {
        if !self.server_reachable() {
            return Ok(None);
        }
        let Some(id) = target.server() else { return Ok(None) };
        if self.log.has_pending_for(target)? {
            tracing::debug!(%target, "record has queued changes; queueing behind them");
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Resolves `id` for a write. A placeholder that is neither confirmed
    /// nor created by a queued add names no record at all.
    fn write_target(&self, id: RecordId) -> Result<RecordId> {
        let target = self.resolve(id);
        if let RecordId::Local(placeholder) = target {
            if !self.log.creates(placeholder)? {
                return Err(Error::NotFound(target));
            }
        }
        Ok(target)
    }

    fn on_network_error(&self, error: TransportError) -> Fallback {
        if error.is_recoverable() {
            tracing::warn!(%error, "server unreachable; switching to offline mode");
            self.server_lost();
            Fallback::Offline
        } else {
            Fallback::Fail(error.into())
        }
    }

    fn patch_cache(&self, patches: &[CachePatch]) {
        if let Err(e) = self.cache.apply(patches) {
            tracing::warn!(error = %e, "failed to update local cache");
        }
    }

    fn announce(&self, action: ChangeAction, subject: ChangeSubject, confirmed: bool) {
        self.data_changed.publish(&DataChanged { action, subject, confirmed });
    }

    fn enqueue(&self, mutation: Mutation) -> Result<QueuedOperation> {
        let op = QueuedOperation::new(self.clock.now(), mutation);
        self.log.append(&op)?;
        tracing::info!(op = %op.id, kind = %op.kind(), target = %op.target(), "queued change for later");
        Ok(op)
    }

    /// Replays the log right away when a write was queued only because
    /// earlier changes to the same record are still waiting. Returns true
    /// if a pass ran.
    async fn flush_if_reachable(&self) -> bool {
        if !self.server_reachable() {
            return false;
        }
        match self.reconcile().await {
            Ok(outcome) => matches!(outcome, ReconcileOutcome::Completed(_)),
            Err(e) => {
                tracing::warn!(error = %e, "reconciliation failed");
                false
            }
        }
    }

    /// Cached records with queued operations replayed on top.
    fn local_views(&self) -> Result<Vec<CourseView>> {
        Ok(project(self.cache.load()?, &self.log.list()?))
    }

    /// The local view of `target`, or `patch` alone if nothing is known
    /// about it locally.
    fn local_view(&self, target: RecordId, patch: &Fields) -> Result<CourseView> {
        Ok(self
            .local_views()?
            .into_iter()
            .find(|view| view.id == target)
            .unwrap_or_else(|| CourseView { id: target, fields: patch.clone(), confirmed: false }))
    }

    pub(super) async fn list(&self, query: &ListQuery) -> Result<Vec<CourseView>> {
        if self.server_reachable() {
            match self.backend.list(query.params()).await {
                Ok(courses) => {
                    if query.is_unfiltered() {
                        if let Err(e) = self.cache.replace_all(&courses) {
                            tracing::warn!(error = %e, "failed to refresh local cache");
                        }
                    } else {
                        let upserts: Vec<_> = courses.iter().cloned().map(CachePatch::Upsert).collect();
                        self.patch_cache(&upserts);
                    }
                    return Ok(project(courses, &self.log.list()?));
                }
                Err(e) => match self.on_network_error(e) {
                    Fallback::Offline => {}
                    Fallback::Fail(e) => return Err(e),
                },
            }
        }
        Ok(query.apply(self.local_views()?))
    }

    pub(super) async fn add(&self, record: Fields) -> Result<CourseView> {
        let record = without_id(record);

        if self.server_reachable() {
            match self.backend.create(record.clone()).await {
                Ok(course) => {
                    self.patch_cache(&[CachePatch::Upsert(course.clone())]);
                    let view = CourseView::from(course);
                    self.announce(ChangeAction::Add, ChangeSubject::Record(view.clone()), true);
                    return Ok(view);
                }
                Err(e) => match self.on_network_error(e) {
                    Fallback::Offline => {}
                    Fallback::Fail(e) => return Err(e),
                },
            }
        }

        let stamp = self.clock.now();
        let placeholder = LocalId(stamp);
        let op = QueuedOperation::new(stamp, Mutation::Add { placeholder, record: record.clone() });
        self.log.append(&op)?;
        tracing::info!(%placeholder, "queued new course for later");

        let view = CourseView { id: RecordId::Local(placeholder), fields: record, confirmed: false };
        self.announce(ChangeAction::Add, ChangeSubject::Record(view.clone()), false);
        Ok(view)
    }

    pub(super) async fn update(&self, id: RecordId, patch: Fields) -> Result<CourseView> {
        let target = self.write_target(id)?;
        let patch = without_id(patch);

        if let Some(server_id) = self.network_target(target)? {
            match self.backend.update(server_id, patch.clone()).await {
                Ok(echoed) => {
                    let mut patches = vec![CachePatch::Merge(server_id, patch.clone())];
                    patches.extend(echoed.clone().map(CachePatch::Upsert));
                    self.patch_cache(&patches);

                    let view = match echoed {
                        Some(course) => CourseView::from(course),
                        None => match self.cache.get(server_id)? {
                            Some(course) => CourseView::from(course),
                            None => CourseView { id: target, fields: patch, confirmed: true },
                        },
                    };
                    self.announce(ChangeAction::Update, ChangeSubject::Record(view.clone()), true);
                    return Ok(view);
                }
                Err(e) if e.is_not_found() => {
                    self.patch_cache(&[CachePatch::Remove(server_id)]);
                    return Err(Error::NotFound(target));
                }
                Err(e) => match self.on_network_error(e) {
                    Fallback::Offline => {}
                    Fallback::Fail(e) => return Err(e),
                },
            }
        }

        self.enqueue(Mutation::Update { target, patch: patch.clone() })?;
        let view = self.local_view(target, &patch)?;
        self.announce(ChangeAction::Update, ChangeSubject::Record(view.clone()), false);
        if self.flush_if_reachable().await {
            return self.local_view(target, &patch);
        }
        Ok(view)
    }

    pub(super) async fn delete(&self, id: RecordId) -> Result<()> {
        let target = self.write_target(id)?;

        if let Some(server_id) = self.network_target(target)? {
            match self.backend.delete(server_id).await {
                Ok(()) => {
                    self.patch_cache(&[CachePatch::Remove(server_id)]);
                    self.announce(ChangeAction::Delete, ChangeSubject::Id(target), true);
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {
                    self.patch_cache(&[CachePatch::Remove(server_id)]);
                    return Err(Error::NotFound(target));
                }
                Err(e) => match self.on_network_error(e) {
                    Fallback::Offline => {}
                    Fallback::Fail(e) => return Err(e),
                },
            }
        }

        self.enqueue(Mutation::Delete { target })?;
        self.announce(ChangeAction::Delete, ChangeSubject::Id(target), false);
        self.flush_if_reachable().await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
