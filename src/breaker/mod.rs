//! Circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! BreakerRegistry::execute_with(name, action, options)
//!     → registry.rs (get-or-create the circuit for `name`)
//!     → handle.rs (lock that circuit only)
//!     → circuit.rs check() (heal if the break duration elapsed)
//!     → circuit.rs is_broken() → skip action, return handle
//!     → circuit.rs execute(action) (count failure, wrap in error.rs)
//!     → registry.rs (surface or swallow the failure)
//!
//! Optional:
//!     sweep.rs periodically heals idle circuits
//! ```
//!
//! # Design Decisions
//! - Threshold plus fixed cool-down; no half-open probing
//! - Failures are values (`Result`), never panics
//! - Correctness per circuit over throughput: one action per circuit at a time

pub mod circuit;
pub mod error;
pub mod handle;
pub mod registry;
pub mod sweep;

pub use circuit::Circuit;
pub use error::CircuitExecutionError;
pub use handle::{CircuitHandle, CircuitSnapshot};
pub use registry::{BreakerDefaults, BreakerRegistry, ExecuteOptions};
pub use sweep::HealingSweep;
