//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use circuits::{AppConfig, BreakerRegistry, HttpServer, Shutdown};
use tokio::net::TcpListener;

/// A demo server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<BreakerRegistry>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the demo server with `config` on 127.0.0.1:0.
pub async fn start_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let registry = Arc::new(BreakerRegistry::from_config(&config.breaker));
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, registry.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        registry,
        shutdown,
    }
}

/// A client that never reuses connections or honours proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
