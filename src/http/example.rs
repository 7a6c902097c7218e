//! The example endpoint protected by a circuit.
//!
//! `GET /api/example?throw_exception=true` simulates a failing data source.
//! After `demo.break_limit` failures the circuit breaks and the endpoint
//! reports when it will be retried instead of calling the data source.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::Deserialize;
use thiserror::Error;

use crate::breaker::handle::to_utc;
use crate::breaker::{BreakerRegistry, ExecuteOptions};
use crate::config::DemoConfig;
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExampleQuery {
    #[serde(default)]
    pub throw_exception: bool,
}

/// Failure injected by the caller through `throw_exception`.
#[derive(Debug, Error)]
#[error("simulated data source failure")]
pub struct SimulatedFailure;

pub async fn get_example(
    State(state): State<AppState>,
    Query(query): Query<ExampleQuery>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let registry = state.registry.clone();
    let demo = state.demo.clone();

    // Actions run synchronously under the circuit's lock.
    let lines = tokio::task::spawn_blocking(move || {
        run_example(&registry, &demo, query.throw_exception)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Example action task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(lines))
}

/// Run the example data fetch through the demo circuit.
pub fn run_example(registry: &BreakerRegistry, demo: &DemoConfig, throw_exception: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let options = ExecuteOptions::new()
        .break_limit(demo.break_limit)
        .break_duration(Duration::from_millis(demo.break_duration_ms))
        .throw_on_error(true);

    let result = registry.execute_with(
        &demo.circuit_name,
        || {
            if throw_exception {
                return Err(SimulatedFailure);
            }
            lines = retrieve_data();
            Ok(())
        },
        options,
    );

    match result {
        Ok(circuit) if circuit.is_broken() => {
            let until = circuit
                .expiration_date()
                .and_then(to_utc)
                .map(|at| at.format("%m/%d/%Y %H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| "further notice".to_string());
            lines.push(format!("Circuit is broken and will not be retried until {until}"));
        }
        Ok(_) => {}
        Err(err) => lines.push(err.to_string()),
    }
    lines
}

fn retrieve_data() -> Vec<String> {
    vec![format!("Retrieved Data from server at - {}", Local::now().format("%m/%d/%Y %H:%M:%S"))]
}
