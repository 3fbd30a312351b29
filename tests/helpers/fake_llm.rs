use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use codenav::llm::LanguageModel;

/// Records every prompt and answers with a canned reply, or fails on demand
#[derive(Default)]
pub struct FakeLlm {
    pub reply: String,
    pub fail_with: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.fail_with {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(self.reply.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}
