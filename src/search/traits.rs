//! Seams between the search backends and their callers.

use anyhow::Result;
use async_trait::async_trait;

use super::ranker::SearchHit;
use crate::storage::ScoredChunk;

/// Ranked search over the indexed repository
#[async_trait]
pub trait Search: Send + Sync {
    /// Up to `limit` hits, highest score first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Identifier used in logs and metrics labels
    fn search_type(&self) -> &'static str;
}

/// Raw nearest-chunk retrieval, used to build LLM context
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The `k` chunks nearest to `query`, by ascending distance
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>>;
}
