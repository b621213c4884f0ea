// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Commands that change courses: add, update and delete.
//!
//! Each connects first. When the server answers the change is sent
//! directly; otherwise it is queued and reported as such.

use std::io::Write;

use sb_core::{CourseView, RecordId};

use crate::cli::FieldArgs;
use crate::error::{Error, Result};

use super::{block_on, Session};

pub fn add(offline: bool, fields: FieldArgs) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute_add(&session, fields, &mut std::io::stdout()))?;
    session.warn_on_background_sync();
    Ok(())
}

pub fn update(offline: bool, id: RecordId, fields: FieldArgs) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute_update(&session, id, fields, &mut std::io::stdout()))?;
    session.warn_on_background_sync();
    Ok(())
}

pub fn delete(offline: bool, id: RecordId) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute_delete(&session, id, &mut std::io::stdout()))?;
    session.warn_on_background_sync();
    Ok(())
}

pub(crate) async fn execute_add(session: &Session, fields: FieldArgs, out: &mut impl Write) -> Result<()> {
    let fields = fields.into_fields();
    if !fields.get("title").is_some_and(|t| t.as_str().is_some_and(|s| !s.trim().is_empty())) {
        return Err(Error::InvalidInput("a course needs a title (--title)".to_string()));
    }

    session.connect().await;
    let course = session.engine.add(fields).await?;
    report_write(out, "Added", &course)
}

pub(crate) async fn execute_update(
    session: &Session,
    id: RecordId,
    fields: FieldArgs,
    out: &mut impl Write,
) -> Result<()> {
    if fields.is_empty() {
        return Err(Error::InvalidInput("nothing to update: pass --title or --field".to_string()));
    }

    session.connect().await;
    let course = session.engine.update(id, fields.into_fields()).await?;
    report_write(out, "Updated", &course)
}

pub(crate) async fn execute_delete(session: &Session, id: RecordId, out: &mut impl Write) -> Result<()> {
    session.connect().await;
    session.engine.delete(id).await?;

    if session.last_change().is_some_and(|change| change.confirmed) {
        writeln!(out, "Deleted {}", id)?;
    } else {
        writeln!(out, "Queued delete of {} (will sync when the server is reachable)", id)?;
    }
    Ok(())
}

fn report_write(out: &mut impl Write, verb: &str, course: &CourseView) -> Result<()> {
    let title = course.title().unwrap_or("(untitled)");
    if course.confirmed {
        writeln!(out, "{} {}: {}", verb, course.id, title)?;
    } else {
        writeln!(out, "Queued {}: {} (will sync when the server is reachable)", course.id, title)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "write_tests.rs"]
mod tests;
