//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the example and admin handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until shutdown is signalled

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::breaker::BreakerRegistry;
use crate::config::{AppConfig, DemoConfig};
use crate::http::example::get_example;
use crate::http::request::MakeRequestUuidV4;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BreakerRegistry>,
    pub demo: DemoConfig,
}

/// HTTP server for the demo and admin API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server sharing `registry` with the rest of the process.
    pub fn new(config: AppConfig, registry: Arc<BreakerRegistry>) -> Self {
        let state = AppState {
            registry,
            demo: config.demo.clone(),
        };
        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/example", get(get_example))
            .route("/health", get(health))
            .merge(setup_admin_router())
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The router, for serving on a custom transport or testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}
