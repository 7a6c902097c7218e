use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::breaker::CircuitSnapshot;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub circuits: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddQuery {
    pub break_limit: Option<u32>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        circuits: state.registry.len(),
    })
}

pub async fn list_circuits(State(state): State<AppState>) -> Json<Vec<CircuitSnapshot>> {
    Json(state.registry.snapshots())
}

pub async fn get_circuit(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CircuitSnapshot>, StatusCode> {
    state
        .registry
        .get(&name)
        .map(|circuit| Json(circuit.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Register a circuit; an existing circuit keeps its configuration.
pub async fn add_circuit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<AddQuery>,
) -> Result<Json<CircuitSnapshot>, StatusCode> {
    let break_limit = query
        .break_limit
        .unwrap_or(state.registry.defaults().break_limit);
    state.registry.add(&name, break_limit);

    state
        .registry
        .get(&name)
        .map(|circuit| Json(circuit.snapshot()))
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn reset_circuits(State(state): State<AppState>) -> StatusCode {
    state.registry.reset();
    StatusCode::NO_CONTENT
}
