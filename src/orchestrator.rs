//! Builds LLM prompts from retrieved code and forwards them to the model.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::browse::resolve_repo_path;
use crate::error::{NavError, NavResult};
use crate::llm::LanguageModel;
use crate::metrics::QUERY_REQUESTS;
use crate::search::Retriever;
use crate::symbol::SymbolCache;

const SYSTEM_INSTRUCTION: &str = "System: You are an AI assistant analyzing a codebase. \
Use the following code context to answer the user's question. \
If the context is insufficient, say so.";

/// Wrap `context` and `question` in the prompt layout the model expects
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{SYSTEM_INSTRUCTION}\n\nCode Context:\n--- BEGIN CONTEXT ---\n{context}\n--- END CONTEXT ---\n\nUser Question: {question}\n\nAnswer:\n"
    )
}

pub struct QueryOrchestrator {
    repo_root: PathBuf,
    retriever: Option<Arc<dyn Retriever>>,
    llm: Option<Arc<dyn LanguageModel>>,
    symbols: Arc<SymbolCache>,
    context_snippets: usize,
}

impl QueryOrchestrator {
    pub fn new(
        repo_root: PathBuf,
        retriever: Option<Arc<dyn Retriever>>,
        llm: Option<Arc<dyn LanguageModel>>,
        symbols: Arc<SymbolCache>,
        context_snippets: usize,
    ) -> Self {
        Self {
            repo_root,
            retriever,
            llm,
            symbols,
            context_snippets,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some() && self.retriever.is_some()
    }

    /// Codebase summary, retrieved snippets and the optional file, as one block
    pub async fn assemble_context(
        &self,
        question: &str,
        context_file: Option<&str>,
    ) -> NavResult<String> {
        let retriever = self.retriever.as_ref().ok_or_else(|| {
            NavError::ServiceUnavailable(
                "Search functionality is not available. Vector store or embedding model not initialized."
                    .to_string(),
            )
        })?;

        let mut context = String::new();

        let summary = self.symbols.summary();
        if !summary.is_empty() {
            context.push_str(&format!("--- Codebase Summary ---\n\n{}\n", summary));
        }

        let retrieved = retriever
            .retrieve(question, self.context_snippets)
            .await
            .map_err(|e| {
                error!(error = %e, "Context retrieval failed");
                NavError::ServiceUnavailable(format!("Search functionality is not available: {}", e))
            })?;

        if !retrieved.is_empty() {
            context.push_str("--- Relevant Code Snippets ---\n\n");
            for scored in &retrieved {
                context.push_str(&format!(
                    "File: {}\n```\n{}\n```\n\n",
                    scored.chunk.file_path, scored.chunk.text
                ));
            }
        }

        if let Some(file) = context_file.map(str::trim).filter(|f| !f.is_empty()) {
            match self.read_context_file(file) {
                Some(text) => context.push_str(&format!(
                    "\n--- Specific File Context: {} ---\n\n```\n{}\n```\n\n",
                    file, text
                )),
                None => warn!(file = file, "Context file skipped"),
            }
        }

        Ok(context)
    }

    fn read_context_file(&self, file: &str) -> Option<String> {
        let path = match resolve_repo_path(&self.repo_root, file) {
            Ok(path) if path.is_file() => path,
            Ok(_) => return None,
            Err(e) => {
                warn!(file = file, error = %e, "Cannot use context file");
                return None;
            }
        };
        match std::fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!(file = file, error = %e, "Failed to read context file");
                None
            }
        }
    }

    /// Answer `question`, optionally focused on one repository file
    pub async fn answer(&self, question: &str, context_file: Option<&str>) -> NavResult<String> {
        QUERY_REQUESTS.inc();

        let question = question.trim();
        if question.is_empty() {
            return Err(NavError::BadRequest("Question must not be empty".to_string()));
        }

        let llm = self.llm.as_ref().ok_or_else(|| {
            NavError::ServiceUnavailable(
                "Language model is not configured. Set the API key environment variable."
                    .to_string(),
            )
        })?;

        let context = self.assemble_context(question, context_file).await?;
        let prompt = build_prompt(&context, question);

        info!(
            model = llm.model_name(),
            prompt_chars = prompt.len(),
            context_file = context_file.unwrap_or(""),
            "Forwarding question to language model"
        );

        llm.complete(&prompt)
            .await
            .map_err(|e| NavError::ExternalService(e.to_string()))
    }
}
