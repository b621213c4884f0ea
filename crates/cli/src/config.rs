// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.syllabus/config.toml` and includes:
//! - `[server]`: where the catalog lives and how to reach it
//! - `[probe]`: health check timing
//! - `[reconnect]`: spacing of reconnection attempts
//!
//! Every field has a default, so an empty file is a valid config. Engine
//! state (pending operations, cached courses) lives next to the config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::{EngineConfig, ProbeConfig};

const WORK_DIR_NAME: &str = ".syllabus";
const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_DIR_NAME: &str = "state";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.syllabus/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub probe: ProbeSettings,
    #[serde(default)]
    pub reconnect: ReconnectSettings,
}

/// Catalog server location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://localhost:3000`.
    pub url: String,
    /// Path of the course collection.
    pub records_path: String,
    /// Health endpoints, tried in order.
    pub health_endpoints: Vec<String>,
    /// Upper bound on any single request.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: "http://localhost:3000".to_string(),
            records_path: "/api/courses".to_string(),
            health_endpoints: vec!["/health".to_string(), "/api/courses?limit=1".to_string()],
            request_timeout_ms: 10_000,
        }
    }
}

/// Connectivity probe timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Per-endpoint timeout.
    pub timeout_ms: u64,
    /// Age at which an unsettled probe is abandoned.
    pub watchdog_ms: u64,
    /// Background status check interval.
    pub monitor_interval_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        ProbeSettings { timeout_ms: 2_000, watchdog_ms: 10_000, monitor_interval_ms: 30_000 }
    }
}

/// Reconnection timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectSettings {
    pub interval_ms: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        ReconnectSettings { interval_ms: 5_000 }
    }
}

impl Config {
    /// Creates a default config pointing at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` is not an http(s) URL.
    pub fn new(url: &str) -> Result<Self> {
        let mut config = Config::default();
        config.server.url = url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.server.url)?;
        if self.server.health_endpoints.is_empty() {
            return Err(Error::Config("server.health_endpoints must not be empty".to_string()));
        }
        let timings = [
            ("server.request_timeout_ms", self.server.request_timeout_ms),
            ("probe.timeout_ms", self.probe.timeout_ms),
            ("probe.watchdog_ms", self.probe.watchdog_ms),
            ("probe.monitor_interval_ms", self.probe.monitor_interval_ms),
            ("reconnect.interval_ms", self.reconnect.interval_ms),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        Ok(())
    }

    /// Loads configuration from the given `.syllabus/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the given `.syllabus/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    /// Engine settings derived from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            probe: ProbeConfig {
                endpoints: self.server.health_endpoints.clone(),
                timeout: Duration::from_millis(self.probe.timeout_ms),
                watchdog: Duration::from_millis(self.probe.watchdog_ms),
            },
            reconnect_interval: Duration::from_millis(self.reconnect.interval_ms),
            monitor_interval: Duration::from_millis(self.probe.monitor_interval_ms),
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    let rest = url.strip_prefix("http://").or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(Error::InvalidUrl(url.to_string())),
    }
}

/// Find the .syllabus directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    let mut current = std::env::current_dir()?;
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Directory holding the engine's durable state.
pub fn state_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(STATE_DIR_NAME)
}

/// Initialize a new .syllabus directory at the given path
pub fn init_work_dir(path: &Path, url: &str) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = Config::new(url)?;
    fs::create_dir_all(state_dir(&work_dir))?;
    config.save(&work_dir)?;
    write_gitignore(&work_dir)?;

    Ok(work_dir)
}

/// Keeps per-machine engine state out of version control.
fn write_gitignore(work_dir: &Path) -> Result<()> {
    let content = "# Pending operations and cached courses\nstate/\n";
    fs::write(work_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
