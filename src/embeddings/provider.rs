use anyhow::Result;
use async_trait::async_trait;

/// Text to vector conversion, the seam in front of the embedding model runtime
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding generated for query"))
    }

    /// Dimension of every vector this provider returns
    fn embedding_dimension(&self) -> usize;

    /// Name used in logs and metrics
    fn provider_name(&self) -> &'static str;
}
