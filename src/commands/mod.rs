//! Subcommand implementations and the component wiring they share.

pub mod ask;
pub mod define;
pub mod index;
pub mod search;
pub mod serve;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::llm::create_language_model;
use crate::storage::{LanceStore, VectorStore};
use crate::web::AppState;

/// Open the embedding model and the vector store sized for it
pub(crate) async fn open_search_backend(
    config: &Config,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn VectorStore>)> {
    let embeddings = config.embeddings.clone();
    let embedder = tokio::task::spawn_blocking(move || create_provider(&embeddings))
        .await
        .context("Embedding model task failed")?
        .context("Failed to initialize embedding model")?;

    let store = LanceStore::open(config.db_path(), embedder.embedding_dimension())
        .await
        .context("Failed to open vector store")?;

    Ok((embedder, Arc::new(store)))
}

/// Build the request-facing state. Missing backends degrade to `None` so the
/// browse and definition endpoints keep working.
pub(crate) async fn build_state(config: Config, repo_root: PathBuf) -> AppState {
    let (embedder, store) = match open_search_backend(&config).await {
        Ok((embedder, store)) => (Some(embedder), Some(store)),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Semantic search disabled");
            (None, None)
        }
    };

    let llm = create_language_model(&config.llm).unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "Language model disabled");
        None
    });

    AppState::new(config, repo_root, store, embedder, llm)
}
