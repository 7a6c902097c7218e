//! Shared handles to registered circuits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::breaker::circuit::Circuit;

/// A reference to a circuit owned by a [`BreakerRegistry`].
///
/// Cloning is cheap; every clone observes the same circuit. Accessors take
/// the circuit's lock briefly, so they wait while that circuit's action runs.
///
/// [`BreakerRegistry`]: crate::breaker::BreakerRegistry
#[derive(Debug, Clone)]
pub struct CircuitHandle {
    inner: Arc<Mutex<Circuit>>,
}

impl CircuitHandle {
    pub(crate) fn new(circuit: Circuit) -> Self {
        Self {
            inner: Arc::new(Mutex::new(circuit)),
        }
    }

    /// Lock the circuit.
    ///
    /// A panic inside an action poisons the mutex, but counters are only
    /// written after the action returns, so the inner state is still sound.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the circuit unless another caller holds it.
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, Circuit>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }

    pub fn name(&self) -> String {
        self.lock().name().to_string()
    }

    pub fn failures(&self) -> u32 {
        self.lock().failures()
    }

    pub fn break_limit(&self) -> u32 {
        self.lock().break_limit()
    }

    pub fn break_duration(&self) -> Duration {
        self.lock().break_duration()
    }

    pub fn execution_attempts(&self) -> u64 {
        self.lock().execution_attempts()
    }

    pub fn is_broken(&self) -> bool {
        self.lock().is_broken()
    }

    /// See [`Circuit::expiration_date`].
    pub fn expiration_date(&self) -> Option<SystemTime> {
        self.lock().expiration_date()
    }

    /// Return true if both handles refer to the same circuit instance.
    pub fn same_circuit(&self, other: &CircuitHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy the circuit's observable state in one lock acquisition.
    pub fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot::from(&*self.lock())
    }
}

/// Point-in-time view of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub failures: u32,
    pub break_limit: u32,
    pub break_duration_ms: u64,
    pub execution_attempts: u64,
    pub broken: bool,
    /// When the circuit may heal. Absent until the first failure.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Circuit> for CircuitSnapshot {
    fn from(circuit: &Circuit) -> Self {
        Self {
            name: circuit.name().to_string(),
            failures: circuit.failures(),
            break_limit: circuit.break_limit(),
            break_duration_ms: u64::try_from(circuit.break_duration().as_millis())
                .unwrap_or(u64::MAX),
            execution_attempts: circuit.execution_attempts(),
            broken: circuit.is_broken(),
            expires_at: circuit.expiration_date().and_then(to_utc),
        }
    }
}

/// Convert to a chrono timestamp, `None` if chrono cannot represent it.
pub(crate) fn to_utc(at: SystemTime) -> Option<DateTime<Utc>> {
    match at.duration_since(UNIX_EPOCH) {
        Ok(after) => DateTime::UNIX_EPOCH.checked_add_signed(TimeDelta::from_std(after).ok()?),
        Err(before) => DateTime::UNIX_EPOCH
            .checked_sub_signed(TimeDelta::from_std(before.duration()).ok()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let handle = CircuitHandle::new(Circuit::new("shared", 1, Duration::from_secs(1)));
        let other = handle.clone();

        let _ = handle.lock().execute(|| Err::<(), _>("nope"));

        assert!(handle.same_circuit(&other));
        assert_eq!(other.failures(), 1);
        assert!(other.is_broken());
    }

    #[test]
    fn test_distinct_circuits_are_not_same() {
        let a = CircuitHandle::new(Circuit::new("a", 1, Duration::from_secs(1)));
        let b = CircuitHandle::new(Circuit::new("a", 1, Duration::from_secs(1)));
        assert!(!a.same_circuit(&b));
    }

    #[test]
    fn test_snapshot_reflects_circuit() {
        let handle = CircuitHandle::new(Circuit::new("snap", 2, Duration::from_millis(1500)));
        let snapshot = handle.snapshot();

        assert_eq!(snapshot.name, "snap");
        assert_eq!(snapshot.break_limit, 2);
        assert_eq!(snapshot.break_duration_ms, 1500);
        assert!(!snapshot.broken);
        assert!(snapshot.expires_at.is_none());

        let _ = handle.lock().execute(|| Err::<(), _>("nope"));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.execution_attempts, 1);
        assert!(snapshot.expires_at.is_some());
    }

    #[test]
    fn test_snapshot_with_far_expiry_has_no_timestamp() {
        let handle = CircuitHandle::new(Circuit::new(
            "far",
            1,
            Duration::from_millis(u64::MAX),
        ));
        let _ = handle.lock().execute(|| Err::<(), _>("nope"));
        assert!(handle.expiration_date().is_some());

        let snapshot = handle.snapshot();
        assert!(snapshot.broken);
        assert_eq!(snapshot.break_duration_ms, u64::MAX);
        assert!(snapshot.expires_at.is_none());
    }

    #[test]
    fn test_to_utc_matches_chrono_for_normal_times() {
        let now = SystemTime::now();
        assert_eq!(to_utc(now), Some(DateTime::<Utc>::from(now)));
        assert_eq!(to_utc(UNIX_EPOCH), Some(DateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let handle = CircuitHandle::new(Circuit::new("poisoned", 1, Duration::from_secs(1)));
        let clone = handle.clone();
        let _ = std::thread::spawn(move || {
            let mut circuit = clone.lock();
            let _ = circuit.execute(|| -> Result<(), &str> { panic!("action panicked") });
        })
        .join();

        assert_eq!(handle.execution_attempts(), 1);
        assert_eq!(handle.failures(), 0);
        assert!(handle.try_lock().is_some());
    }
}
