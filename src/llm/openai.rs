use anyhow::{anyhow, bail, Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, error};

use super::LanguageModel;
use crate::config::LlmConfig;
use crate::metrics::{LLM_ERRORS, LLM_LATENCY};

/// Client for any OpenAI-compatible chat completions endpoint
pub struct ChatClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        if config.model.trim().is_empty() {
            bail!("Language model name must not be empty");
        }

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.trim_end_matches('/'));
        }

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .context("Failed to build chat message")?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .build()
            .context("Failed to build chat request")?;

        let start = Instant::now();
        let response = self.client.chat().create(request).await.map_err(|e| {
            LLM_ERRORS.inc();
            error!(model = %self.model, error = %e, "Language model call failed");
            anyhow!(e)
        })?;
        LLM_LATENCY.observe(start.elapsed().as_secs_f64());

        debug!(
            model = %self.model,
            choices = response.choices.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Language model responded"
        );

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Language model returned no content"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
