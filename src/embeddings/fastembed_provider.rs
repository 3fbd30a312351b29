use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::provider::EmbeddingProvider;
use crate::config::EmbeddingsConfig;
use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS};

/// Local ONNX embedding model loaded through fastembed
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
    batch_size: usize,
}

impl FastEmbedProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let (model_type, dimension) = Self::parse_model_name(&config.model)?;

        info!(model = %config.model, "Loading embedding model");

        let model = TextEmbedding::try_new(
            InitOptions::new(model_type).with_show_download_progress(true),
        )
        .with_context(|| format!("Failed to initialize embedding model: {}", config.model))?;

        info!(model = %config.model, dimension, "Embedding model loaded");

        Ok(Self {
            model: Arc::new(model),
            model_name: config.model.clone(),
            dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Map a configured model name to the fastembed model and its dimension
    fn parse_model_name(name: &str) -> Result<(EmbeddingModel, usize)> {
        let parsed = match name {
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                (EmbeddingModel::AllMiniLML6V2, 384)
            }
            "bge-small-en-v1.5" | "bge-small" | "BAAI/bge-small-en-v1.5" => {
                (EmbeddingModel::BGESmallENV15, 384)
            }
            "bge-base-en-v1.5" | "bge-base" | "BAAI/bge-base-en-v1.5" => {
                (EmbeddingModel::BGEBaseENV15, 768)
            }
            "nomic-embed-text-v1.5" | "nomic-embed-text" | "nomic-ai/nomic-embed-text-v1.5" => {
                (EmbeddingModel::NomicEmbedTextV15, 768)
            }
            other => bail!("Unsupported embedding model: {}", other),
        };
        Ok(parsed)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        let model = self.model.clone();
        let texts = texts.to_vec();
        let batch_size = self.batch_size;

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut embeddings = Vec::with_capacity(texts.len());
            for batch in texts.chunks(batch_size) {
                let batch: Vec<&str> = batch.iter().map(|s| s.as_str()).collect();
                embeddings.extend(
                    model
                        .embed(batch, None)
                        .context("Failed to generate embeddings")?,
                );
            }
            Ok::<_, anyhow::Error>(embeddings)
        })
        .await
        .context("Embedding task failed")??;

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());
        debug!(model = %self.model_name, count = embeddings.len(), "Embedded texts");

        Ok(embeddings)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &'static str {
        "fastembed"
    }
}
