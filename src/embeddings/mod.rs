mod fastembed_provider;
mod mock;
mod provider;

pub use fastembed_provider::FastEmbedProvider;
pub use mock::MockEmbedder;
pub use provider::EmbeddingProvider;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{EmbeddingProviderKind, EmbeddingsConfig};

/// Dimension used by the mock provider (matches all-MiniLM-L6-v2)
pub const MOCK_DIMENSION: usize = 384;

/// Build the provider selected in the configuration
pub fn create_provider(config: &EmbeddingsConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::FastEmbed => Ok(Arc::new(FastEmbedProvider::new(config)?)),
        EmbeddingProviderKind::Mock => Ok(Arc::new(MockEmbedder::new(MOCK_DIMENSION))),
    }
}
