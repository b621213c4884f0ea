// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local mirror of the course collection.
//!
//! The cache holds the last known server state and is only read while the
//! server is unreachable. Pending operations are never written into it;
//! [`project`] overlays them at read time instead.

use std::sync::{Arc, Mutex};

use sb_core::course::merge_patch;
use sb_core::store::{self, DurableStore};
use sb_core::{Course, CourseView, Fields, Mutation, QueuedOperation, RecordId, ServerId};

/// Well-known storage key of the cached courses.
pub const CACHE_KEY: &str = "courses";

/// A change to apply to the cache once the server has confirmed it.
#[derive(Debug, Clone, PartialEq)]
pub enum CachePatch {
    /// Insert or replace a record with the server's copy.
    Upsert(Course),
    /// Merge fields into an existing record.
    Merge(ServerId, Fields),
    /// Drop a record.
    Remove(ServerId),
}

/// Durable cache of server records.
pub struct LocalCache {
    store: Arc<dyn DurableStore>,
    write_lock: Mutex<()>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        LocalCache { store, write_lock: Mutex::new(()) }
    }

    pub fn load(&self) -> sb_core::Result<Vec<Course>> {
        store::read_all(self.store.as_ref(), CACHE_KEY)
    }

    pub fn get(&self, id: ServerId) -> sb_core::Result<Option<Course>> {
        Ok(self.load()?.into_iter().find(|c| c.id == id))
    }

    /// Replaces the whole collection, e.g. after a full listing.
    pub fn replace_all(&self, courses: &[Course]) -> sb_core::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        store::write_all(self.store.as_ref(), CACHE_KEY, courses)
    }

    /// Applies a batch of patches in order as one write.
    pub fn apply(&self, patches: &[CachePatch]) -> sb_core::Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut courses = self.load()?;
        for patch in patches {
            apply_patch(&mut courses, patch);
        }
        store::write_all(self.store.as_ref(), CACHE_KEY, &courses)
    }
}

fn apply_patch(courses: &mut Vec<Course>, patch: &CachePatch) {
    match patch {
        CachePatch::Upsert(course) => match courses.iter_mut().find(|c| c.id == course.id) {
            Some(existing) => *existing = course.clone(),
            None => courses.push(course.clone()),
        },
        CachePatch::Merge(id, fields) => {
            if let Some(existing) = courses.iter_mut().find(|c| c.id == *id) {
                merge_patch(&mut existing.fields, fields);
            }
        }
        CachePatch::Remove(id) => courses.retain(|c| c.id != *id),
    }
}

/// Builds the collection a reader should see: cached records with pending
/// operations replayed on top, in enqueue order.
///
/// Queued adds show up under their placeholder ids; any record a pending
/// operation touched is marked unconfirmed.
pub fn project(courses: Vec<Course>, pending: &[QueuedOperation]) -> Vec<CourseView> {
    let mut views: Vec<CourseView> = courses.into_iter().map(CourseView::from).collect();
    for op in pending {
        match &op.mutation {
            Mutation::Add { placeholder, record } => views.push(CourseView {
                id: RecordId::Local(*placeholder),
                fields: record.clone(),
                confirmed: false,
            }),
            Mutation::Update { target, patch } => {
                if let Some(view) = views.iter_mut().find(|v| v.id == *target) {
                    merge_patch(&mut view.fields, patch);
                    view.confirmed = false;
                }
            }
            Mutation::Delete { target } => views.retain(|v| v.id != *target),
        }
    }
    views
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
