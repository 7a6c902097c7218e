//! Name → circuit registry.
//!
//! # Responsibilities
//! - Get-or-create exactly one circuit per name, even under races
//! - Drive every call through check → broken test → execute
//! - Decide whether action failures are surfaced or swallowed
//!
//! # Design Decisions
//! - One registry per owner, shared via `Arc`, no process-global state
//! - Guards are per circuit: unrelated names never wait on each other
//! - The map's shard lock is released before any action runs
//! - Configuration binds on first creation; later options are ignored

use std::time::Duration;

use dashmap::DashMap;

use crate::breaker::circuit::Circuit;
use crate::breaker::error::CircuitExecutionError;
use crate::breaker::handle::{CircuitHandle, CircuitSnapshot};
use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Default failures allowed before a registry circuit breaks.
pub const DEFAULT_BREAK_LIMIT: u32 = 1;

/// Default time a registry circuit stays broken.
pub const DEFAULT_BREAK_DURATION: Duration = Duration::from_secs(30);

/// Configuration applied to circuits created without explicit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerDefaults {
    pub break_limit: u32,
    pub break_duration: Duration,
}

impl Default for BreakerDefaults {
    fn default() -> Self {
        Self {
            break_limit: DEFAULT_BREAK_LIMIT,
            break_duration: DEFAULT_BREAK_DURATION,
        }
    }
}

impl From<&BreakerConfig> for BreakerDefaults {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            break_limit: config.default_break_limit,
            break_duration: Duration::from_millis(config.default_break_duration_ms),
        }
    }
}

/// Per-call options for [`BreakerRegistry::execute_with`].
///
/// `break_limit` and `break_duration` only matter when the call creates the
/// circuit. Unset values fall back to the registry's [`BreakerDefaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub break_limit: Option<u32>,
    pub break_duration: Option<Duration>,
    /// Return the action's failure instead of swallowing it.
    pub throw_on_error: bool,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn break_limit(mut self, break_limit: u32) -> Self {
        self.break_limit = Some(break_limit);
        self
    }

    #[must_use]
    pub fn break_duration(mut self, break_duration: Duration) -> Self {
        self.break_duration = Some(break_duration);
        self
    }

    #[must_use]
    pub fn throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }
}

/// A concurrency-safe set of named circuits.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    circuits: DashMap<String, CircuitHandle>,
    defaults: BreakerDefaults,
}

impl BreakerRegistry {
    /// Create an empty registry with the standard defaults (1 failure, 30s).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: BreakerDefaults) -> Self {
        Self {
            circuits: DashMap::new(),
            defaults,
        }
    }

    pub fn from_config(config: &BreakerConfig) -> Self {
        Self::with_defaults(BreakerDefaults::from(config))
    }

    pub fn defaults(&self) -> BreakerDefaults {
        self.defaults
    }

    /// Return the circuit for `name`, creating it with the given settings if
    /// it does not exist yet. Settings are ignored for an existing circuit.
    pub fn get_or_create(
        &self,
        name: &str,
        break_limit: u32,
        break_duration: Duration,
    ) -> CircuitHandle {
        if let Some(existing) = self.circuits.get(name) {
            return existing.value().clone();
        }

        let mut created = false;
        let handle = self
            .circuits
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                CircuitHandle::new(Circuit::new(name, break_limit, break_duration))
            })
            .value()
            .clone();

        if created {
            tracing::info!(
                circuit = %name,
                break_limit,
                break_duration_ms = u64::try_from(break_duration.as_millis()).unwrap_or(u64::MAX),
                "Circuit created"
            );
            metrics::record_registered(self.circuits.len());
        }
        handle
    }

    /// Look up a circuit without creating it.
    pub fn get(&self, name: &str) -> Option<CircuitHandle> {
        self.circuits.get(name).map(|entry| entry.value().clone())
    }

    /// Register `name` with the default break duration unless it exists.
    pub fn add(&self, name: &str, break_limit: u32) {
        self.get_or_create(name, break_limit, self.defaults.break_duration);
    }

    /// Run `action` through the circuit `name` using the registry defaults.
    ///
    /// Failures are recorded and swallowed; inspect the returned handle to
    /// observe them.
    pub fn execute<E, F>(&self, name: &str, action: F) -> CircuitHandle
    where
        F: FnOnce() -> Result<(), E>,
        E: std::fmt::Display,
    {
        let handle = self.resolve(name, &ExecuteOptions::default());
        let _ = self.run(&handle, action, false);
        handle
    }

    /// Run `action` through the circuit `name`.
    ///
    /// The action is skipped while the circuit is broken. With
    /// `throw_on_error` set, an action failure is returned as
    /// [`CircuitExecutionError`]; otherwise it is only recorded.
    pub fn execute_with<E, F>(
        &self,
        name: &str,
        action: F,
        options: ExecuteOptions,
    ) -> Result<CircuitHandle, CircuitExecutionError<E>>
    where
        F: FnOnce() -> Result<(), E>,
        E: std::fmt::Display,
    {
        let handle = self.resolve(name, &options);
        self.run(&handle, action, options.throw_on_error)?;
        Ok(handle)
    }

    /// Drop every circuit.
    ///
    /// Calls already in flight finish against the detached circuit.
    pub fn reset(&self) {
        let removed = self.circuits.len();
        self.circuits.clear();
        metrics::record_registered(0);
        tracing::info!(removed, "Circuit registry reset");
    }

    /// Heal every circuit whose break duration has elapsed.
    ///
    /// Circuits busy running an action are skipped; they are checked by that
    /// call's successor anyway. Returns the number of circuits healed.
    pub fn sweep(&self) -> usize {
        let mut healed = 0;
        for handle in self.handles() {
            let Some(mut circuit) = handle.try_lock() else {
                continue;
            };
            if circuit.check() {
                tracing::info!(circuit = %circuit.name(), "Circuit healed by sweep");
                metrics::record_heal(circuit.name());
                healed += 1;
            }
        }
        healed
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.circuits.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshots of every circuit, sorted by name.
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        let mut snapshots: Vec<CircuitSnapshot> =
            self.handles().iter().map(CircuitHandle::snapshot).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Clone the handles out so no shard lock is held while circuits are locked.
    fn handles(&self) -> Vec<CircuitHandle> {
        self.circuits.iter().map(|e| e.value().clone()).collect()
    }

    fn resolve(&self, name: &str, options: &ExecuteOptions) -> CircuitHandle {
        self.get_or_create(
            name,
            options.break_limit.unwrap_or(self.defaults.break_limit),
            options.break_duration.unwrap_or(self.defaults.break_duration),
        )
    }

    fn run<E, F>(
        &self,
        handle: &CircuitHandle,
        action: F,
        throw_on_error: bool,
    ) -> Result<(), CircuitExecutionError<E>>
    where
        F: FnOnce() -> Result<(), E>,
        E: std::fmt::Display,
    {
        let mut circuit = handle.lock();

        if circuit.check() {
            tracing::info!(circuit = %circuit.name(), "Circuit healed");
            metrics::record_heal(circuit.name());
        }

        if circuit.is_broken() {
            tracing::debug!(
                circuit = %circuit.name(),
                failures = circuit.failures(),
                "Circuit is broken, skipping action"
            );
            metrics::record_rejection(circuit.name());
            return Ok(());
        }

        metrics::record_execution(circuit.name());
        match circuit.execute(action) {
            Ok(()) => Ok(()),
            Err(err) => {
                metrics::record_failure(circuit.name());
                tracing::warn!(
                    circuit = %circuit.name(),
                    failures = circuit.failures(),
                    error = %err.cause(),
                    suppressed = !throw_on_error,
                    "Circuit action failed"
                );
                if circuit.is_broken() {
                    tracing::warn!(
                        circuit = %circuit.name(),
                        failures = circuit.failures(),
                        break_limit = circuit.break_limit(),
                        "Circuit broken"
                    );
                }
                if throw_on_error {
                    return Err(err);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn failing(calls: &AtomicU32) -> Result<(), &'static str> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("this is an error")
    }

    #[test]
    fn test_execute_invokes_action() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);

        let circuit = registry.execute("test_circuit", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(())
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(circuit.execution_attempts(), 1);
        assert_eq!(circuit.break_limit(), DEFAULT_BREAK_LIMIT);
        assert_eq!(circuit.break_duration(), DEFAULT_BREAK_DURATION);
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let registry = BreakerRegistry::new();
        let first = registry.get_or_create("shared", 3, Duration::from_secs(5));
        let second = registry.get_or_create("shared", 9, Duration::from_secs(60));

        assert!(first.same_circuit(&second));
        assert_eq!(second.break_limit(), 3);
        assert_eq!(second.break_duration(), Duration::from_secs(5));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_execute_options_ignored_for_existing_circuit() {
        let registry = BreakerRegistry::new();
        registry.add("bound", 4);

        let calls = AtomicU32::new(0);
        let circuit = registry
            .execute_with(
                "bound",
                || failing(&calls),
                ExecuteOptions::new().break_limit(1),
            )
            .unwrap();

        assert_eq!(circuit.break_limit(), 4);
        assert!(!circuit.is_broken());
    }

    #[test]
    fn test_get_does_not_create() {
        let registry = BreakerRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = BreakerRegistry::new();
        registry.add("orders", 2);
        registry.add("orders", 7);

        let circuit = registry.get("orders").unwrap();
        assert_eq!(circuit.break_limit(), 2);
        assert_eq!(circuit.break_duration(), DEFAULT_BREAK_DURATION);
    }

    #[test]
    fn test_throw_on_error_surfaces_cause() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);

        let err = registry
            .execute_with(
                "loud",
                || failing(&calls),
                ExecuteOptions::new().throw_on_error(true),
            )
            .unwrap_err();

        assert_eq!(err.circuit(), "loud");
        assert_eq!(*err.cause(), "this is an error");
        assert_eq!(registry.get("loud").unwrap().failures(), 1);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_surfaced_failure_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);
        tracing::subscriber::with_default(subscriber, || {
            let result = registry.execute_with(
                "loud",
                || failing(&calls),
                ExecuteOptions::new().break_limit(5).throw_on_error(true),
            );
            assert!(result.is_err());
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Circuit action failed"));
        assert!(output.contains("circuit=loud"));
        assert!(output.contains("suppressed=false"));
    }

    #[test]
    fn test_created_log_saturates_huge_duration() {
        let registry = BreakerRegistry::new();
        let circuit = registry.get_or_create("huge", 1, Duration::MAX);
        assert_eq!(circuit.break_duration(), Duration::MAX);
        assert_eq!(circuit.snapshot().break_duration_ms, u64::MAX);
    }

    #[test]
    fn test_unbounded_break_duration_stays_broken() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);
        let options = ExecuteOptions::new().break_duration(Duration::MAX);

        registry.execute_with("stuck", || failing(&calls), options).unwrap();
        let circuit = registry.execute_with("stuck", || failing(&calls), options).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(circuit.is_broken());
        assert_eq!(registry.sweep(), 0);
        let snapshots = registry.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].expires_at.is_none());
    }

    #[test]
    fn test_broken_circuit_is_not_an_error_even_when_throwing() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);
        let options = ExecuteOptions::new().throw_on_error(true);

        assert!(registry.execute_with("loud", || failing(&calls), options).is_err());
        let circuit = registry.execute_with("loud", || failing(&calls), options).unwrap();

        assert!(circuit.is_broken());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registry_defaults_apply() {
        let registry = BreakerRegistry::with_defaults(BreakerDefaults {
            break_limit: 5,
            break_duration: Duration::from_secs(2),
        });
        let circuit = registry.execute("custom", || Ok::<_, &str>(()));

        assert_eq!(circuit.break_limit(), 5);
        assert_eq!(circuit.break_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_reset_creates_fresh_circuit() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);
        let before = registry.execute("flaky", || failing(&calls));
        assert!(before.is_broken());

        registry.reset();
        assert!(registry.get("flaky").is_none());

        let after = registry.execute("flaky", || failing(&calls));
        assert!(!after.same_circuit(&before));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sweep_heals_expired_circuits() {
        let registry = BreakerRegistry::new();
        let calls = AtomicU32::new(0);
        let options = ExecuteOptions::new().break_duration(Duration::from_millis(50));
        let circuit = registry.execute_with("short", || failing(&calls), options).unwrap();
        registry.execute_with("never", || failing(&calls), options.break_duration(Duration::ZERO))
            .unwrap();

        assert_eq!(registry.sweep(), 0);
        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(registry.sweep(), 1);
        assert!(!circuit.is_broken());
        assert!(registry.get("never").unwrap().is_broken());
    }

    #[test]
    fn test_unrelated_circuits_do_not_block_each_other() {
        let registry = Arc::new(BreakerRegistry::new());
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let slow_registry = registry.clone();
        let slow = std::thread::spawn(move || {
            slow_registry.execute("slow", || {
                entered_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                Ok::<_, &str>(())
            });
        });

        entered_rx.recv().unwrap();
        let fast = registry.execute("fast", || Ok::<_, &str>(()));
        assert_eq!(fast.execution_attempts(), 1);

        release_tx.send(()).unwrap();
        slow.join().unwrap();
    }

    #[test]
    fn test_snapshots_are_sorted() {
        let registry = BreakerRegistry::new();
        registry.add("zeta", 1);
        registry.add("alpha", 1);

        let names: Vec<String> = registry.snapshots().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }
}
