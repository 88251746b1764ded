//! # fieldops-api entry point
//!
//! Initializes tracing, loads configuration from the environment,
//! connects the optional database mirror, hydrates in-memory state, and
//! serves the Axum app.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fieldops_api::db;
use fieldops_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let pool = db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;

    let port = config.port;
    let state = AppState::with_config(config, pool);
    db::hydrate(&state)
        .await
        .context("state hydration failed")?;

    let app = fieldops_api::app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "fieldops-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
