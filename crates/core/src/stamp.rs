// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic stamps for ordering queued operations.
//!
//! A stamp combines wall clock time with a logical counter so that two
//! stamps generated by the same clock are always distinct and strictly
//! increasing, even if the wall clock stalls or steps backwards.
//!
//! Format: `{wall_ms}-{counter}`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// A monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Logical counter for stamps issued within the same millisecond.
    pub counter: u32,
}

impl Stamp {
    pub fn new(wall_ms: u64, counter: u32) -> Self {
        Stamp { wall_ms, counter }
    }

    /// Parses a stamp from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Ord for Stamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms.cmp(&other.wall_ms).then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for Stamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wall_ms, self.counter)
    }
}

impl FromStr for Stamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (wall, counter) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidStamp(format!("expected format 'wall_ms-counter', got '{s}'")))?;

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidStamp(format!("invalid wall_ms '{wall}' in '{s}'")))?;

        let counter = counter
            .parse::<u32>()
            .map_err(|_| Error::InvalidStamp(format!("invalid counter '{counter}' in '{s}'")))?;

        Ok(Stamp::new(wall_ms, counter))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
    }
}

/// Issues strictly increasing stamps.
pub struct StampClock {
    clock: Box<dyn ClockSource>,
    last: Mutex<Stamp>,
}

impl StampClock {
    /// Creates a stamp clock backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl ClockSource + 'static) -> Self {
        StampClock { clock: Box::new(clock), last: Mutex::new(Stamp::new(0, 0)) }
    }

    /// Generates the next stamp.
    pub fn now(&self) -> Stamp {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let next = if physical > last.wall_ms {
            Stamp::new(physical, 0)
        } else {
            Stamp::new(last.wall_ms, last.counter.saturating_add(1))
        };
        *last = next;
        next
    }

    /// Ensures every later stamp sorts after `seen`.
    ///
    /// Called with the newest stamp found in persisted state so that a
    /// restarted client never reissues an id still sitting in its log.
    pub fn observe(&self, seen: Stamp) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if seen > *last {
            *last = seen;
        }
    }
}

impl Default for StampClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StampClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("StampClock").field("last", &*last).finish()
    }
}

#[cfg(test)]
#[path = "stamp_tests.rs"]
mod tests;
