//! Formdesk API server

use std::net::SocketAddr;

use anyhow::Context;
use formdesk_api::{build_router, build_service, ApiState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Formdesk API v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load().context("failed to load configuration")?;
    let service = build_service(&config).context("failed to open storage")?;
    tracing::info!(
        backend = ?config.storage.backend,
        pattern_policy = ?config.validation.pattern_policy,
        environment = %config.environment,
        "form service ready"
    );

    let addr = config.socket_addr().context("invalid host/port")?;
    let app = build_router(ApiState::new(service, config.environment.clone()), &config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");
    tracing::info!("health check at http://{addr}/health, docs at http://{addr}/docs");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
