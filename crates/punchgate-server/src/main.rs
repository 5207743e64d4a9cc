use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use punchgate_device::ZkConnector;
use punchgate_server::{Cli, ConnectionManager, GatewayConfig, routes};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("punchgate_server=info,tower_http=info")),
        )
        .init();

    let config = GatewayConfig::from(Cli::parse());

    info!(
        device = %config.device.device_addr,
        timeout_ms = config.device.timeout.as_millis() as u64,
        mode = %config.connection_mode,
        "Starting punchgate {}",
        punchgate_core::VERSION
    );

    let connector = ZkConnector::new(config.device.clone());
    let manager = Arc::new(ConnectionManager::new(connector, config.connection_mode));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, routes::app(Arc::clone(&manager)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    manager.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
