use anyhow::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::provider::EmbeddingProvider;

/// Deterministic hash-based embedder for tests and offline runs.
///
/// Each lowercase word contributes a pseudo-random unit direction, so texts
/// sharing words end up closer than unrelated ones.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn word_vector(&self, word: &str, out: &mut [f32]) {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        let mut seed = hasher.finish();

        for slot in out.iter_mut() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            *slot += ((seed >> 33) % 2000) as f32 / 1000.0 - 1.0;
        }
    }

    fn text_to_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        let mut words = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .peekable();

        if words.peek().is_none() {
            self.word_vector(text, &mut vector);
        }
        for word in words {
            self.word_vector(word, &mut vector);
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in vector.iter_mut() {
                *v /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.text_to_vector(t)).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_mock_embedder_deterministic() {
        let embedder = MockEmbedder::new(64);
        let vec1 = embedder.embed_query("parse config file").await.unwrap();
        let vec2 = embedder.embed_query("parse config file").await.unwrap();
        assert_eq!(vec1, vec2);
    }

    #[tokio::test]
    async fn test_mock_embedder_dimension_and_norm() {
        let embedder = MockEmbedder::new(128);
        let vec = embedder.embed_query("test").await.unwrap();

        assert_eq!(vec.len(), 128);
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_words_are_closer() {
        let embedder = MockEmbedder::new(256);
        let vectors = embedder
            .embed(&[
                "def load_config(path): pass".to_string(),
                "load_config reads the file".to_string(),
                "render html template".to_string(),
            ])
            .await
            .unwrap();

        assert!(cosine(&vectors[0], &vectors[1]) > cosine(&vectors[0], &vectors[2]));
    }

    #[tokio::test]
    async fn test_embed_preserves_order_and_count() {
        let embedder = MockEmbedder::new(16);
        let texts = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);
    }
}
