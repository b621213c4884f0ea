// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sbrs - An offline-resilient client library for the course catalog.
//!
//! This crate provides the core functionality for the `sb` CLI tool. Reads
//! and writes go to the catalog server while it is reachable; while it is
//! not, writes are queued in a durable operation log and replayed in order
//! once it comes back.
//!
//! # Main Components
//!
//! - [`OfflineEngine`](sync::OfflineEngine) - The engine: connectivity,
//!   reconnection, the operation log and reconciliation
//! - [`Config`] - Project configuration (server URL, probe and retry timing)
//! - [`sync`] - Engine components and the [`Backend`](sync::Backend) seam
//! - [`Error`] - Error types for all operations
//!
//! # Initialization
//!
//! Use [`init_work_dir`] to create a new `.syllabus/` directory, then open
//! an engine over its state directory:
//!
//! ```rust,ignore
//! use sbrs::{find_work_dir, init_work_dir, state_dir, Config};
//!
//! let work_dir = init_work_dir(Path::new("."), "http://localhost:3000")?;
//!
//! // Later, find an existing project
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let store = FileStore::open(&state_dir(&work_dir))?;
//! ```

mod cli;
mod commands;
mod display;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, FieldArgs, OutputFormat};
pub use config::{find_work_dir, init_work_dir, state_dir, Config};
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .map_err(|e| Error::InvalidInput(format!("cannot change to directory '{}': {}", dir, e)))?;
    }

    let offline = cli.offline;
    match cli.command {
        Command::Init { url, path } => commands::init::run(&url, path),
        Command::Status => commands::status::run(offline),
        Command::List { search, limit, output } => commands::list::run(offline, search, limit, output),
        Command::Add { fields } => commands::write::add(offline, fields),
        Command::Update { id, fields } => commands::write::update(offline, id, fields),
        Command::Delete { id } => commands::write::delete(offline, id),
        Command::Pending { output } => commands::pending::run(output),
        Command::Sync => commands::sync::sync(offline),
        Command::Reconnect => commands::sync::reconnect(offline),
    }
}
