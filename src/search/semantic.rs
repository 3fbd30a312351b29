use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::ranker::{Ranker, SearchHit};
use super::traits::{Retriever, Search};
use crate::embeddings::EmbeddingProvider;
use crate::metrics::{SEARCH_LATENCY, SEARCH_REQUESTS, SEARCH_RESULTS};
use crate::storage::{ScoredChunk, VectorStore};

const SEARCH_TYPE: &str = "semantic";

/// Embeds the query, pulls nearest chunks from the store and ranks them
pub struct SemanticSearch {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    ranker: Ranker,
    candidates: usize,
}

impl SemanticSearch {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        ranker: Ranker,
        candidates: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            ranker,
            candidates,
        }
    }
}

#[async_trait]
impl Retriever for SemanticSearch {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self
            .embedder
            .embed_query(query)
            .await
            .with_context(|| format!("Failed to embed query: {}", query))?;

        debug!(dimension = vector.len(), k, "Querying vector store");

        self.store
            .query(&vector, k)
            .await
            .context("Vector store query failed")
    }
}

#[async_trait]
impl Search for SemanticSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        SEARCH_REQUESTS.with_label_values(&[SEARCH_TYPE]).inc();
        let start = Instant::now();

        info!(search_type = SEARCH_TYPE, query = query, "Starting search");

        let candidates = self.retrieve(query, self.candidates.max(limit)).await?;
        let retrieved = candidates.len();

        let mut hits = self.ranker.rank(query, candidates);
        hits.truncate(limit);

        let elapsed = start.elapsed();
        SEARCH_LATENCY
            .with_label_values(&[SEARCH_TYPE])
            .observe(elapsed.as_secs_f64());
        SEARCH_RESULTS.observe(hits.len() as f64);

        info!(
            search_type = SEARCH_TYPE,
            query = query,
            retrieved,
            results = hits.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search completed"
        );

        Ok(hits)
    }

    fn search_type(&self) -> &'static str {
        SEARCH_TYPE
    }
}
