//! Language model access behind the [`LanguageModel`] trait.

mod openai;

pub use openai::ChatClient;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LlmConfig;

/// Answers a fully assembled prompt
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` and return the generated text verbatim
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Build the configured client, or `None` when no API key is available
pub fn create_language_model(config: &LlmConfig) -> Result<Option<Arc<dyn LanguageModel>>> {
    let Some(api_key) = config.api_key() else {
        warn!(
            env = %config.api_key_env,
            "No language model API key set; question answering is disabled"
        );
        return Ok(None);
    };

    let client = ChatClient::new(config, api_key)?;
    info!(model = %config.model, "Language model client ready");
    Ok(Some(Arc::new(client)))
}
