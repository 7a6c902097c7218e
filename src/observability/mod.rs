//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry and circuits produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Every log event about a circuit carries its name as a field
//! - Metrics are cheap and silently dropped when no exporter is installed

pub mod logging;
pub mod metrics;
