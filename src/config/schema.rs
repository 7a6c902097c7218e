//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for circuits created by the registry.
    pub breaker: BreakerConfig,

    /// Demo HTTP server settings.
    pub server: ServerConfig,

    /// The example circuit exposed by the demo endpoint.
    pub demo: DemoConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Registry defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures allowed before a circuit breaks (0 = never).
    pub default_break_limit: u32,

    /// Time a broken circuit waits before it may heal (0 = never).
    pub default_break_duration_ms: u64,

    /// Optional background healing.
    pub sweep: SweepConfig,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            default_break_limit: 1,
            default_break_duration_ms: 30_000,
            sweep: SweepConfig::default(),
        }
    }
}

/// Periodic sweep that heals expired circuits without waiting for a call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 1_000,
        }
    }
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Settings of the circuit behind `/api/example`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    pub circuit_name: String,
    pub break_limit: u32,
    pub break_duration_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            circuit_name: "MyCircuit".to_string(),
            break_limit: 2,
            break_duration_ms: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "circuits=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9000".to_string(),
        }
    }
}
