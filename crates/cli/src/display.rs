// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sb_core::{CourseView, OperationResult, Outcome, QueuedOperation, SyncReport};

const UNTITLED: &str = "(untitled)";

/// Format a course for list output.
///
/// Courses with changes the server has not confirmed are marked.
pub fn format_course_line(course: &CourseView) -> String {
    let title = course.title().unwrap_or(UNTITLED);
    if course.confirmed {
        format!("- {}: {}", course.id, title)
    } else {
        format!("- {}: {} (not synced)", course.id, title)
    }
}

/// Format a queued operation for `sb pending`.
pub fn format_operation_line(op: &QueuedOperation) -> String {
    format!(
        "{}  {:<6}  {}  (queued {})",
        op.id,
        op.kind().to_string(),
        op.target(),
        op.enqueued_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Describes a replayed operation that stayed in the log, or `None` if it
/// was settled.
pub fn format_unsettled(result: &OperationResult) -> Option<String> {
    let reason = match &result.outcome {
        Outcome::Applied { .. } | Outcome::Skipped { .. } => return None,
        Outcome::Failed { reason } => format!("rejected: {reason}"),
        Outcome::Deferred { reason } => format!("waiting: {reason}"),
    };
    Some(format!("{} {} ({}) {}", result.kind, result.target, result.op_id, reason))
}

/// One-line summary of a reconciliation pass.
pub fn format_report_summary(report: &SyncReport) -> String {
    let settled = report.settled_count();
    let pending = report.pending_count();
    if pending == 0 {
        format!("Synced {} change(s)", settled)
    } else {
        format!("Synced {} change(s), {} still queued", settled, pending)
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
