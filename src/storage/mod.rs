//! Vector storage for chunk embeddings.

mod lancedb;
mod memory;

pub use self::lancedb::LanceStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::indexer::Chunk;

/// A chunk paired with its embedding
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A stored chunk returned by a similarity query.
///
/// `distance` is the cosine distance to the query (0 identical, 2 opposite).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Persistent collection of chunk embeddings
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop every record and start from an empty collection
    async fn rebuild(&self) -> Result<()>;

    /// Insert records, replacing existing ones with the same chunk id
    async fn upsert(&self, records: Vec<EmbeddingRecord>) -> Result<()>;

    /// The `k` nearest chunks by ascending cosine distance
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;

    fn backend_name(&self) -> &'static str;
}

/// Cosine distance `1 - cos(a, b)`; vectors with zero norm are treated as orthogonal
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0)
}
