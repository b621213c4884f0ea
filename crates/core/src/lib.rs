// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sb-core: Shared library for the syllabus course-catalog client
//!
//! This crate provides the data model used by the offline engine: record
//! identifiers, course records, queued operations, connectivity status,
//! broadcast events, monotonic stamps and durable storage.

pub mod course;
pub mod error;
pub mod event;
pub mod id;
pub mod op;
pub mod stamp;
pub mod status;
pub mod store;

pub use course::{Course, CourseView, Fields};
pub use error::{Error, Result};
pub use event::{ChangeAction, ChangeSubject, DataChanged, OperationResult, Outcome, Reconnected, SyncReport};
pub use id::{LocalId, RecordId, ServerId};
pub use op::{Mutation, OpId, OpKind, QueuedOperation};
pub use stamp::{ClockSource, Stamp, StampClock, SystemClock};
pub use status::ConnectivityStatus;
pub use store::{DurableStore, FileStore, MemoryStore, StoreError};
