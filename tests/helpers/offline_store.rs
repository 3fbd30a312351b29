use anyhow::{bail, Result};
use async_trait::async_trait;

use codenav::storage::{EmbeddingRecord, ScoredChunk, VectorStore};

/// Vector store whose backend has gone away after startup
pub struct OfflineStore;

#[async_trait]
impl VectorStore for OfflineStore {
    async fn rebuild(&self) -> Result<()> {
        bail!("connection refused")
    }

    async fn upsert(&self, _records: Vec<EmbeddingRecord>) -> Result<()> {
        bail!("connection refused")
    }

    async fn query(&self, _vector: &[f32], _k: usize) -> Result<Vec<ScoredChunk>> {
        bail!("connection refused")
    }

    async fn count(&self) -> Result<usize> {
        bail!("connection refused")
    }

    fn backend_name(&self) -> &'static str {
        "offline"
    }
}
