// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::cli::OutputFormat;
use crate::display::format_operation_line;
use crate::error::Result;

use super::Session;

/// Lists the operation log without contacting the server.
pub fn run(output: OutputFormat) -> Result<()> {
    let session = Session::open(true)?;
    execute(&session, output, &mut std::io::stdout())
}

pub(crate) fn execute(session: &Session, output: OutputFormat, out: &mut impl Write) -> Result<()> {
    let ops = session.engine.pending_operations()?;

    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&ops)?)?;
        }
        OutputFormat::Text => {
            if ops.is_empty() {
                writeln!(out, "No pending changes")?;
                return Ok(());
            }
            writeln!(out, "{} pending change(s):", ops.len())?;
            for op in &ops {
                writeln!(out, "  {}", format_operation_line(op))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
