// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit synchronization: `sb sync` and `sb reconnect`.

use std::io::Write;

use sb_core::SyncReport;

use crate::display::{format_report_summary, format_unsettled};
use crate::error::{Error, Result};
use crate::sync::ReconcileOutcome;

use super::{block_on, Session};

pub fn sync(offline: bool) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute_sync(&session, &mut std::io::stdout()))
}

pub fn reconnect(offline: bool) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute_reconnect(&session, &mut std::io::stdout()))
}

/// Replays the operation log.
///
/// Connecting already replays the log when the server answers, so the
/// reports collected while connecting are printed along with any pass run
/// here.
pub(crate) async fn execute_sync(session: &Session, out: &mut impl Write) -> Result<()> {
    let status = session.connect().await;
    if !status.is_server_available() {
        return Err(Error::ServerUnavailable { pending: session.engine.pending_operation_count()? });
    }

    let mut reports = session.take_reports();
    if reports.is_empty() {
        if let ReconcileOutcome::Completed(report) = session.engine.reconcile().await? {
            if !report.results.is_empty() {
                reports.push(report);
            }
        }
    }
    print_reports(out, &reports)?;

    let pending = session.engine.pending_operation_count()?;
    if pending > 0 && !session.engine.status().is_server_available() {
        return Err(Error::ServerUnavailable { pending });
    }
    Ok(())
}

/// Checks the server right away, replaying the log if it is back.
pub(crate) async fn execute_reconnect(session: &Session, out: &mut impl Write) -> Result<()> {
    if !session.engine.manual_reconnect().await {
        return Err(Error::ServerUnavailable { pending: session.engine.pending_operation_count()? });
    }

    writeln!(out, "Connected to {}", session.server)?;
    print_reports(out, &session.take_reports())
}

fn print_reports(out: &mut impl Write, reports: &[SyncReport]) -> Result<()> {
    if reports.is_empty() {
        writeln!(out, "Nothing to sync")?;
        return Ok(());
    }
    for report in reports {
        writeln!(out, "{}", format_report_summary(report))?;
        for line in report.results.iter().filter_map(format_unsettled) {
            writeln!(out, "warning: {}", line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
