// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

use sb_core::RecordId;

pub use args::FieldArgs;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a course id: a server id (`42`) or a placeholder (`local:…`).
fn record_id(s: &str) -> Result<RecordId, String> {
    s.parse().map_err(|e: sb_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "sb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "An offline-resilient client for the course catalog")]
#[command(
    long_about = "An offline-resilient client for the course catalog.\n\n\
    Changes made while the catalog server is unreachable are queued locally\n\
    and replayed in order once it is back."
)]
pub struct Cli {
    /// Run as if sb was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    /// Treat the network as down; nothing is sent to the server
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a catalog client in the current directory
    #[command(after_help = "\
Examples:
  sb init                                  Use http://localhost:3000
  sb init --url https://catalog.example    Use a remote catalog server")]
    Init {
        /// Catalog server URL
        #[arg(long, default_value = "http://localhost:3000")]
        url: String,

        /// Path to initialize (defaults to current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Show connectivity and the number of queued changes
    Status,

    /// List courses, including changes not yet confirmed by the server
    #[command(after_help = "\
Examples:
  sb list                        All courses
  sb list -s algebra -n 5        First five courses with 'algebra' in the title
  sb list -o json                Machine-readable output")]
    List {
        /// Only courses whose title contains this text
        #[arg(long, short)]
        search: Option<String>,

        /// Maximum number of results
        #[arg(long = "limit", short = 'n')]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Add a course
    #[command(after_help = "\
Examples:
  sb add -t \"Linear Algebra\"                  Title only
  sb add -t \"Databases\" -f credits=4          With a typed field")]
    Add {
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change fields of a course
    #[command(arg_required_else_help = true)]
    Update {
        /// Course id (server id or local:… placeholder)
        #[arg(value_parser = record_id)]
        id: RecordId,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a course
    #[command(arg_required_else_help = true)]
    Delete {
        /// Course id (server id or local:… placeholder)
        #[arg(value_parser = record_id)]
        id: RecordId,
    },

    /// Show changes waiting to be sent to the server
    Pending {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Send queued changes to the server now
    Sync,

    /// Check the server right away and sync if it is back
    Reconnect,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
