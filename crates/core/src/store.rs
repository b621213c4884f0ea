// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key/value storage for client state.
//!
//! Each well-known key holds an ordered list of JSON records. On disk a key
//! is a JSON Lines file: appends write one line and fsync, replacements write
//! a sibling temp file and rename it over the original so a crash never
//! leaves a half-written list behind.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Error type for storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the storage quota.
    #[error("storage quota exceeded writing '{key}' (limit {limit} bytes)")]
    QuotaExceeded { key: String, limit: usize },
}

/// Result type for storage backends.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A line-oriented durable store.
pub trait DurableStore: Send + Sync {
    /// Reads every line stored under `key`. Missing keys read as empty.
    fn read_lines(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Appends one line under `key`.
    fn append_line(&self, key: &str, line: &str) -> StoreResult<()>;

    /// Replaces everything under `key` with `lines` in one step.
    fn replace_lines(&self, key: &str, lines: &[String]) -> StoreResult<()>;
}

/// Appends a serialized record under `key`.
pub fn append<T: Serialize>(store: &dyn DurableStore, key: &str, record: &T) -> Result<()> {
    let json = serde_json::to_string(record)?;
    store.append_line(key, &json)?;
    Ok(())
}

/// Reads all records under `key`, skipping blank lines.
pub fn read_all<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for line in store.read_lines(key)? {
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Replaces all records under `key`.
pub fn write_all<T: Serialize>(store: &dyn DurableStore, key: &str, records: &[T]) -> Result<()> {
    let lines = records.iter().map(serde_json::to_string).collect::<serde_json::Result<Vec<_>>>()?;
    store.replace_lines(key, &lines)?;
    Ok(())
}

/// Directory-backed store: one `<key>.jsonl` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        Ok(FileStore { root: root.to_path_buf() })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.jsonl"))
    }
}

impl DurableStore for FileStore {
    fn read_lines(&self, key: &str) -> StoreResult<Vec<String>> {
        let file = match File::open(self.path_for(key)) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let lines = BufReader::new(file).lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(lines)
    }

    fn append_line(&self, key: &str, line: &str) -> StoreResult<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(self.path_for(key))?;
        writeln!(file, "{line}")?;
        file.sync_all()?;
        Ok(())
    }

    fn replace_lines(&self, key: &str, lines: &[String]) -> StoreResult<()> {
        let path = self.path_for(key);
        let tmp = self.root.join(format!("{key}.jsonl.tmp"));

        let mut file = File::create(&tmp)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store with an optional byte quota.
///
/// Used by tests, and by embedders that do not need state to outlive the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
    quota: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses writes once it holds `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        let store = Self::default();
        store.set_quota(Some(limit));
        store
    }

    pub fn set_quota(&self, limit: Option<usize>) {
        *self.quota.lock().unwrap_or_else(|e| e.into_inner()) = limit;
    }

    fn check_quota(
        &self,
        entries: &HashMap<String, Vec<String>>,
        key: &str,
        replaced: usize,
        added: usize,
    ) -> StoreResult<()> {
        let quota = *self.quota.lock().unwrap_or_else(|e| e.into_inner());
        let Some(limit) = quota else {
            return Ok(());
        };
        let used: usize = entries.values().flatten().map(String::len).sum();
        if used - replaced + added > limit {
            return Err(StoreError::QuotaExceeded { key: key.to_string(), limit });
        }
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    fn read_lines(&self, key: &str) -> StoreResult<Vec<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    fn append_line(&self, key: &str, line: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.check_quota(&entries, key, 0, line.len())?;
        entries.entry(key.to_string()).or_default().push(line.to_string());
        Ok(())
    }

    fn replace_lines(&self, key: &str, lines: &[String]) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let replaced = entries.get(key).map(|l| l.iter().map(String::len).sum()).unwrap_or(0);
        let added = lines.iter().map(String::len).sum();
        self.check_quota(&entries, key, replaced, added)?;
        entries.insert(key.to_string(), lines.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
