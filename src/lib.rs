//! Named circuit breakers with a concurrency-safe registry.
//!
//! ```
//! use circuits::{BreakerRegistry, ExecuteOptions};
//! use std::time::Duration;
//!
//! let registry = BreakerRegistry::new();
//! let options = ExecuteOptions::new()
//!     .break_limit(2)
//!     .break_duration(Duration::from_secs(10));
//!
//! let circuit = registry
//!     .execute_with("inventory", || Err::<(), _>("timeout"), options)
//!     .unwrap();
//! assert_eq!(circuit.failures(), 1);
//! assert!(!circuit.is_broken());
//! ```

pub mod admin;
pub mod breaker;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use breaker::{
    BreakerDefaults, BreakerRegistry, Circuit, CircuitExecutionError, CircuitHandle,
    CircuitSnapshot, ExecuteOptions,
};
pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
