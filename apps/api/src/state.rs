use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::store::Repository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Explicitly constructed persistence handle; closed on shutdown.
    pub repo: Arc<dyn Repository>,
    pub llm: Arc<dyn CompletionClient>,
    pub config: Config,
}
