//! Metrics collection and exposition.
//!
//! # Metrics
//! - `circuit_executions_total` (counter): actions run, by circuit
//! - `circuit_failures_total` (counter): actions that failed, by circuit
//! - `circuit_rejections_total` (counter): calls skipped while broken, by circuit
//! - `circuit_heals_total` (counter): failure counts reset, by circuit
//! - `circuits_registered` (gauge): circuits in the registry
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op (tests, libraries)
//! - Exporter is opt-in via configuration

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

/// Errors from metrics initialization.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("failed to install metrics exporter: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("circuit_executions_total", "Actions executed through a circuit");
    describe_counter!("circuit_failures_total", "Actions that returned an error");
    describe_counter!("circuit_rejections_total", "Calls skipped because the circuit was broken");
    describe_counter!("circuit_heals_total", "Broken circuits whose failures were reset");
    describe_gauge!("circuits_registered", "Circuits currently held by the registry");
}

pub fn record_execution(circuit: &str) {
    counter!("circuit_executions_total", "circuit" => circuit.to_string()).increment(1);
}

pub fn record_failure(circuit: &str) {
    counter!("circuit_failures_total", "circuit" => circuit.to_string()).increment(1);
}

pub fn record_rejection(circuit: &str) {
    counter!("circuit_rejections_total", "circuit" => circuit.to_string()).increment(1);
}

pub fn record_heal(circuit: &str) {
    counter!("circuit_heals_total", "circuit" => circuit.to_string()).increment(1);
}

pub fn record_registered(count: usize) {
    gauge!("circuits_registered").set(count as f64);
}
