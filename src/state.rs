use anyhow::Context;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::embedding::{self, Embedder};
use crate::services::index_cache::IndexCache;
use crate::services::llm_provider::{ChatModel, RigChatModel};
use crate::services::session_store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionStore>,
    pub index_cache: Arc<IndexCache>,
    pub embedder: Arc<dyn Embedder>,
    pub chat: Arc<dyn ChatModel>,
}

impl AppState {
    pub fn new(config: AppConfig, embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>) -> Self {
        let index_cache = IndexCache::new(config.embedding.index_cache_capacity);
        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionStore::new()),
            index_cache: Arc::new(index_cache),
            embedder,
            chat,
        }
    }

    /// Loads the embedding model and wires the configured LLM provider.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let embedder =
            embedding::create_embedder(&config.embedding).context("Failed to create embedder")?;
        let chat: Arc<dyn ChatModel> = Arc::new(RigChatModel::new(&config.llm));
        Ok(Self::new(config, embedder, chat))
    }
}
