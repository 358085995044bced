//! LLM Chat Relay - Main entry point
//!
//! Loads configuration, installs logging and metrics, and serves the relay.

use anyhow::Result;
use llm_chat_relay::{
    build_router,
    core::{init_metrics, init_tracing, AppConfig},
    AppState, UpstreamClient,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before reading any environment variables)
    dotenvy::dotenv().ok();

    init_tracing();
    init_metrics();

    let config = AppConfig::from_env()?;
    let upstream = UpstreamClient::from_config(&config)?;

    tracing::info!(
        upstream = %upstream.base_url(),
        models_timeout_secs = config.upstream.models_timeout_secs,
        chat_timeout_secs = config.upstream.chat_timeout_secs,
        verify_ssl = config.verify_ssl,
        "Upstream configured"
    );

    let app = build_router(Arc::new(AppState::new(upstream)));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting LLM chat relay on {}", addr);
    tracing::info!("Endpoints: GET /health, GET /models, POST /chat");
    tracing::info!("Swagger UI: /docs, metrics: /metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
