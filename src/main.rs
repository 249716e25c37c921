use std::path::PathBuf;

use axum::routing::get;
use storefront::config::Configuration;
use storefront::{app, initialize_state, telemetry};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::setup_logging();
    let metrics = telemetry::setup_metrics_recorder()?;

    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => Configuration::default().path(PathBuf::from(path)),
        Err(_) => Configuration::default(),
    }
    .read();
    let port = config.port();

    let state = initialize_state(config).await?;
    let router = app(state).route(
        "/metrics",
        get(move || std::future::ready(metrics.render())),
    );

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
