// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use sbrs::Cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `SB_LOG=sbrs=debug`.
const LOG_ENV: &str = "SB_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = sbrs::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so command output stays clean. `-v` overrides the
/// environment filter.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
