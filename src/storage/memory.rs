use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{cosine_distance, EmbeddingRecord, ScoredChunk, VectorStore};

/// In-process store with brute-force cosine search.
///
/// Insertion order is kept so equal distances come back deterministically.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<EmbeddingRecord>,
    positions: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn rebuild(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.records.clear();
        inner.positions.clear();
        Ok(())
    }

    async fn upsert(&self, records: Vec<EmbeddingRecord>) -> Result<()> {
        let mut inner = self.inner.write().await;
        for record in records {
            match inner.positions.get(&record.chunk.id).copied() {
                Some(pos) => inner.records[pos] = record,
                None => {
                    let pos = inner.records.len();
                    inner.positions.insert(record.chunk.id.clone(), pos);
                    inner.records.push(record);
                }
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let inner = self.inner.read().await;
        let mut scored: Vec<ScoredChunk> = inner
            .records
            .iter()
            .map(|r| ScoredChunk {
                chunk: r.chunk.clone(),
                distance: cosine_distance(vector, &r.vector),
            })
            .collect();
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.records.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
