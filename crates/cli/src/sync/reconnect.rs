// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection controller.
//!
//! While the network is up but the server is not, a background task
//! re-checks the server on a constant interval until a check succeeds or
//! the schedule is stopped. The session bookkeeping lives in
//! [`ReconnectSession`], a plain value that can be driven without timers.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default spacing between reconnection attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectState {
    /// No schedule armed.
    #[default]
    Idle,
    /// Re-checking the server; `attempt` counts failed checks so far.
    Probing { attempt: u32 },
}

/// Transitions of one reconnection session.
#[derive(Debug, Clone, Default)]
pub struct ReconnectSession {
    state: ReconnectState,
}

impl ReconnectSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReconnectState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ReconnectState::Probing { .. })
    }

    /// Failed checks in the current session, zero when idle.
    pub fn attempt(&self) -> u32 {
        match self.state {
            ReconnectState::Idle => 0,
            ReconnectState::Probing { attempt } => attempt,
        }
    }

    /// Idle → Probing. Returns false if a session was already running.
    pub fn begin(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = ReconnectState::Probing { attempt: 0 };
        true
    }

    /// Counts a failed check. Returns the new attempt count, or `None`
    /// when no session is running.
    pub fn record_failure(&mut self) -> Option<u32> {
        match &mut self.state {
            ReconnectState::Idle => None,
            ReconnectState::Probing { attempt } => {
                *attempt = attempt.saturating_add(1);
                Some(*attempt)
            }
        }
    }

    /// Probing → Idle after a successful check. Returns the number of
    /// failed checks that preceded it.
    pub fn record_success(&mut self) -> Option<u32> {
        let failed = self.is_active().then(|| self.attempt());
        self.state = ReconnectState::Idle;
        failed
    }

    /// Abandons the session. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = ReconnectState::Idle;
        was_active
    }
}

/// Something the controller can ask "is the server back?".
pub trait Prober: Send + Sync {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Owns the periodic re-check task.
pub struct ReconnectController {
    interval: Duration,
    session: Arc<Mutex<ReconnectSession>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl ReconnectController {
    pub fn new(interval: Duration) -> Self {
        ReconnectController {
            interval,
            session: Arc::new(Mutex::new(ReconnectSession::new())),
            cancel: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ReconnectState {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).state()
    }

    pub fn is_active(&self) -> bool {
        self.state() != ReconnectState::Idle
    }

    /// Arms the schedule: checks immediately, then every interval.
    ///
    /// Returns false (and does nothing) if a schedule is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, prober: Weak<dyn Prober>) -> bool {
        let mut cancel = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        if cancel.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return false;
        }

        self.session.lock().unwrap_or_else(|e| e.into_inner()).begin();
        let token = CancellationToken::new();
        *cancel = Some(token.clone());
        tracing::info!(interval = ?self.interval, "server unreachable; scheduling reconnection");

        tokio::spawn(run(prober, Arc::clone(&self.session), self.interval, token));
        true
    }

    /// Cancels the schedule. Safe to call when nothing is running.
    ///
    /// A check already in progress is allowed to finish; its result is
    /// discarded by the controller.
    pub fn stop(&self) -> bool {
        let token = self.cancel.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(token) = &token {
            token.cancel();
        }
        let was_active = self.session.lock().unwrap_or_else(|e| e.into_inner()).cancel();
        if was_active {
            tracing::debug!("reconnection schedule stopped");
        }
        token.is_some() || was_active
    }
}

impl Drop for ReconnectController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.get_mut().unwrap_or_else(|e| e.into_inner()).take() {
            token.cancel();
        }
    }
}

async fn run(
    prober: Weak<dyn Prober>,
    session: Arc<Mutex<ReconnectSession>>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        // The owner is gone; nothing left to reconnect.
        let Some(prober) = prober.upgrade() else { return };
        let reachable = prober.check().await;
        drop(prober);

        let mut session = session.lock().unwrap_or_else(|e| e.into_inner());
        if cancel.is_cancelled() {
            return;
        }
        if reachable {
            let failed = session.record_success().unwrap_or(0);
            tracing::info!(failed_attempts = failed, "server reachable again");
            cancel.cancel();
            return;
        }
        if let Some(attempt) = session.record_failure() {
            tracing::debug!(attempt, "reconnection attempt failed");
        }
    }
}

#[cfg(test)]
#[path = "reconnect_tests.rs"]
mod tests;
