//! Circuit breaker demo service.
//!
//! ```text
//!     GET /api/example ──▶ example handler ──▶ BreakerRegistry ──▶ "MyCircuit" ──▶ data source
//!     /admin/circuits  ──▶ admin handlers  ──▶ BreakerRegistry (inspect / add / reset)
//!                                              ▲
//!                          HealingSweep ───────┘ (optional)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use circuits::breaker::{BreakerRegistry, HealingSweep};
use circuits::config::{load_config, AppConfig};
use circuits::lifecycle::{signals::shutdown_signal, Shutdown};
use circuits::observability::{logging, metrics};
use circuits::HttpServer;

#[derive(Parser)]
#[command(name = "circuits-demo")]
#[command(about = "Demo HTTP service for named circuit breakers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("circuits-demo v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        default_break_limit = config.breaker.default_break_limit,
        default_break_duration_ms = config.breaker.default_break_duration_ms,
        sweep_enabled = config.breaker.sweep.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let registry = Arc::new(BreakerRegistry::from_config(&config.breaker));
    let shutdown = Shutdown::new();

    let sweep = HealingSweep::new(registry.clone(), config.breaker.sweep.clone());
    let sweep_task = tokio::spawn(sweep.run(shutdown.subscribe()));

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, registry);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;
    sweep_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
