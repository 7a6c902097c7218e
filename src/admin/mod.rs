//! Admin API for inspecting and managing circuits.

pub mod handlers;

use axum::{
    routing::get,
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/circuits", get(list_circuits).delete(reset_circuits))
        .route("/admin/circuits/{name}", get(get_circuit).put(add_circuit))
}
