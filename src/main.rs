use anyhow::Context;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tokio::net::TcpListener;
use tracing::{error, info};

use cafeteria_rs::{
    build_app, init_observability, observability::Metrics, shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (basic logging only)
    let config = Config::from_environment().context("Failed to load configuration")?;
    println!("Configuration loaded successfully");

    // Initialize comprehensive observability
    init_observability(&config.observability).context("Failed to initialize observability")?;

    info!("Starting cafeteria-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!(
        "Database: {} (table={})",
        config.database.database_url, config.database.table_name
    );

    // Initialize metrics
    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // Build the application router
    let app = build_app(&config, metrics)
        .await
        .context("Failed to build application")?;

    // Create socket address
    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Set up graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
