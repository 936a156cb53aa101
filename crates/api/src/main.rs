use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use talentflow_api::app::{build_app, build_services};
use talentflow_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    talentflow_observability::init();

    let config = AppConfig::from_env();
    info!(config = ?config, "configuration loaded");

    let services = Arc::new(build_services(&config));
    let workers = services.start_workers();
    let app = build_app(services, &config.jwt_secret);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    workers.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c; shutting down");
    }
    info!("shutdown signal received");
}
