// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::cli::OutputFormat;
use crate::display::format_course_line;
use crate::error::Result;
use crate::sync::ListQuery;

use super::{block_on, Session};

pub fn run(offline: bool, search: Option<String>, limit: Option<usize>, output: OutputFormat) -> Result<()> {
    let session = Session::open(offline)?;
    let query = ListQuery { title_contains: search, limit };
    block_on(execute(&session, &query, output, &mut std::io::stdout()))?;
    session.warn_on_background_sync();
    Ok(())
}

pub(crate) async fn execute(
    session: &Session,
    query: &ListQuery,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let status = session.connect().await;
    let courses = session.engine.list(query).await?;

    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&courses)?)?;
        }
        OutputFormat::Text => {
            if courses.is_empty() {
                writeln!(out, "No courses")?;
            }
            for course in &courses {
                writeln!(out, "{}", format_course_line(course))?;
            }
            if !status.is_server_available() {
                writeln!(out)?;
                writeln!(out, "({}; showing local copy)", status)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
