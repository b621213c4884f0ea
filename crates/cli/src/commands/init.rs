// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{init_work_dir, state_dir};
use crate::error::Result;

pub fn run(url: &str, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    execute(&target_path, url, &mut std::io::stdout())
}

pub(crate) fn execute(target_path: &Path, url: &str, out: &mut impl Write) -> Result<()> {
    let work_dir = init_work_dir(target_path, url)?;

    writeln!(out, "Initialized syllabus at {}", work_dir.display())?;
    writeln!(out, "Server: {}", url.trim_end_matches('/'))?;
    writeln!(out, "State: {}", state_dir(&work_dir).display())?;
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
