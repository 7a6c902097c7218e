//! A single named circuit.
//!
//! # States
//! - Connected: failures below the break limit, the action runs
//! - Broken: failures reached the break limit, the action is skipped
//!
//! # State Transitions
//! ```text
//! Connected → Broken: failures >= break_limit (break_limit > 0)
//! Broken → Connected: check() observed strictly after last failure + break_duration
//! ```
//!
//! # Design Decisions
//! - Healing is lazy: nothing happens until someone calls `check()`
//! - A break limit of 0 never breaks, a break duration of 0 never heals
//! - Failures accumulate without decay until healed

use std::time::{Duration, Instant, SystemTime};

use crate::breaker::error::CircuitExecutionError;

/// Break duration used by [`Circuit::with_break_limit`].
pub const DEFAULT_CIRCUIT_BREAK_DURATION: Duration = Duration::from_secs(5 * 60);

/// Tracks failures of one unit of application logic and decides whether
/// that logic may currently run.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    /// Failures allowed before breaking. 0 means the circuit never breaks.
    break_limit: u32,
    /// How long to stay broken after the last failure. Zero means forever.
    break_duration: Duration,
    /// Failures recorded since the circuit was last healed.
    failures: u32,
    /// Monotonic time of the last failure, drives healing.
    last_failure: Option<Instant>,
    /// Wall-clock time of the last failure, for reporting.
    last_failure_at: Option<SystemTime>,
    execution_attempts: u64,
}

impl Circuit {
    /// Create a circuit with an explicit break limit and duration.
    pub fn new(name: impl Into<String>, break_limit: u32, break_duration: Duration) -> Self {
        Self {
            name: name.into(),
            break_limit,
            break_duration,
            failures: 0,
            last_failure: None,
            last_failure_at: None,
            execution_attempts: 0,
        }
    }

    /// Create a circuit that stays broken for five minutes.
    pub fn with_break_limit(name: impl Into<String>, break_limit: u32) -> Self {
        Self::new(name, break_limit, DEFAULT_CIRCUIT_BREAK_DURATION)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn break_limit(&self) -> u32 {
        self.break_limit
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    /// Failures recorded since the circuit was last healed.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Every call to [`Circuit::execute`], successful or not.
    pub fn execution_attempts(&self) -> u64 {
        self.execution_attempts
    }

    /// Wall-clock time after which the circuit may heal.
    ///
    /// `None` until the first failure, or when the break duration reaches
    /// past what the clock can represent.
    pub fn expiration_date(&self) -> Option<SystemTime> {
        self.last_failure_at
            .and_then(|at| at.checked_add(self.break_duration))
    }

    /// Monotonic counterpart of [`Circuit::expiration_date`].
    pub fn expires_at(&self) -> Option<Instant> {
        self.last_failure
            .and_then(|at| at.checked_add(self.break_duration))
    }

    /// Return true if the action must be skipped.
    pub fn is_broken(&self) -> bool {
        self.break_limit > 0 && self.failures >= self.break_limit
    }

    /// Heal the circuit if its break duration has elapsed.
    ///
    /// Returns true when the failure count was reset.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    pub(crate) fn check_at(&mut self, now: Instant) -> bool {
        if self.break_duration.is_zero() || self.last_failure.is_none() {
            return false;
        }
        // An expiry beyond the clock's range never arrives.
        match self.expires_at() {
            Some(expires_at) if now > expires_at => {
                self.failures = 0;
                true
            }
            _ => false,
        }
    }

    /// Run `action`, counting it as a failure if it returns an error.
    ///
    /// The circuit does not consult [`Circuit::is_broken`] here; admission
    /// control belongs to the caller.
    pub fn execute<T, E, F>(&mut self, action: F) -> Result<T, CircuitExecutionError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.execution_attempts += 1;
        action().map_err(|cause| {
            self.record_failure(Instant::now(), SystemTime::now());
            CircuitExecutionError::new(self.name.as_str(), cause)
        })
    }

    fn record_failure(&mut self, now: Instant, wall: SystemTime) {
        self.failures = self.failures.saturating_add(1);
        self.last_failure = Some(now);
        self.last_failure_at = Some(wall);
    }
}
