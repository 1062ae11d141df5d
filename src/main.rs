//! bookplay-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bookplay_gateway::api;
use bookplay_gateway::app_state::AppState;
use bookplay_gateway::backend::{Backend, InMemoryBackend, PostgresBackend};
use bookplay_gateway::config::{BackendKind, GatewayConfig};
use bookplay_gateway::domain::ChangeFeed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, backend = ?config.backend, "starting bookplay-gateway");

    // Build backend
    let feed = ChangeFeed::new(config.change_feed_capacity);
    let backend = build_backend(&config, feed.clone()).await?;

    // Build application state and router
    let app_state = AppState::new(&config, backend, feed);
    let app = api::build_app(app_state, config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_backend(
    config: &GatewayConfig,
    feed: ChangeFeed,
) -> anyhow::Result<Arc<dyn Backend>> {
    match config.backend {
        BackendKind::Postgres => {
            let backend = PostgresBackend::connect(config, feed)
                .await
                .context("connecting to PostgreSQL")?;
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => match &config.seed_file {
            Some(path) => Ok(Arc::new(load_seed(path, feed).await?)),
            None => {
                tracing::warn!("memory backend started without SEED_FILE; all tables are empty");
                Ok(Arc::new(InMemoryBackend::new(feed)))
            }
        },
    }
}

async fn load_seed(path: &Path, feed: ChangeFeed) -> anyhow::Result<InMemoryBackend> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let seed: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    let backend = InMemoryBackend::from_seed(seed, feed).context("loading seed rows")?;
    tracing::info!(path = %path.display(), "memory backend seeded");
    Ok(backend)
}
