mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, DEFAULT_SECRET};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryRepository, PgRepository, Repository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mentor API v{}", env!("CARGO_PKG_VERSION"));

    if config.secret == DEFAULT_SECRET {
        warn!("SECRET is not set; tokens are signed with the built-in default");
    }

    // Initialize persistence
    let repo: Arc<dyn Repository> = if config.uses_memory_store() {
        warn!("DATABASE_URL=memory: data will not survive a restart");
        Arc::new(MemoryRepository::new())
    } else {
        let pool = create_pool(&config.database_url, config.sql_retry).await?;
        Arc::new(PgRepository::new(pool))
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_base_url)?;
    info!(
        "LLM client initialized (base: {}, model: {})",
        config.openai_base_url, config.openai_model
    );

    // Build app state
    let state = AppState {
        repo: repo.clone(),
        llm: Arc::new(llm),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(CorsLayer::permissive()); // TODO: restrict CORS to the web client's origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
