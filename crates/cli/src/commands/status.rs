// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::error::Result;

use super::{block_on, Session};

pub fn run(offline: bool) -> Result<()> {
    let session = Session::open(offline)?;
    block_on(execute(&session, &mut std::io::stdout()))?;
    session.warn_on_background_sync();
    Ok(())
}

pub(crate) async fn execute(session: &Session, out: &mut impl Write) -> Result<()> {
    let status = session.connect().await;
    let pending = session.engine.pending_operation_count()?;

    writeln!(out, "Server: {}", session.server)?;
    writeln!(out, "Status: {}", status)?;
    writeln!(out, "Pending changes: {}", pending)?;
    if pending > 0 && !status.is_server_available() {
        writeln!(out)?;
        writeln!(out, "Changes will be sent once the server is reachable.")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
