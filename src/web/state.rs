//! Shared state injected into every handler.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::llm::LanguageModel;
use crate::orchestrator::QueryOrchestrator;
use crate::search::{Ranker, RepoScanner, Retriever, Search, SemanticSearch};
use crate::storage::VectorStore;
use crate::symbol::SymbolCache;

/// Cloned per request; everything heavy sits behind an `Arc`.
///
/// `search` and `store` are `None` when the vector store or the embedding
/// model could not be initialized. Handlers that need them answer 503.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo_root: PathBuf,
    pub search: Option<Arc<dyn Search>>,
    pub store: Option<Arc<dyn VectorStore>>,
    pub scanner: Arc<RepoScanner>,
    pub symbols: Arc<SymbolCache>,
    pub orchestrator: Arc<QueryOrchestrator>,
}

impl AppState {
    /// Wire the search, scan, symbol and query components from `config`.
    ///
    /// Semantic search needs both a store and an embedder. The symbol cache
    /// starts empty; call [`SymbolCache::rebuild`] before serving.
    pub fn new(
        config: Config,
        repo_root: PathBuf,
        store: Option<Arc<dyn VectorStore>>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Self {
        let ranker = Ranker::from_config(&config.search);

        let semantic = match (&store, embedder) {
            (Some(store), Some(embedder)) => Some(Arc::new(SemanticSearch::new(
                store.clone(),
                embedder,
                ranker.clone(),
                config.search.candidates,
            ))),
            _ => None,
        };

        let scanner = Arc::new(RepoScanner::new(
            repo_root.clone(),
            config.indexer.clone(),
            ranker,
            config.search.scan_limit,
        ));

        let symbols = Arc::new(SymbolCache::new(
            config.tags_path(),
            config.llm.summary_max_chars,
        ));

        let retriever = semantic.clone().map(|s| s as Arc<dyn Retriever>);
        let orchestrator = Arc::new(QueryOrchestrator::new(
            repo_root.clone(),
            retriever,
            llm,
            symbols.clone(),
            config.llm.context_snippets,
        ));

        Self {
            config: Arc::new(config),
            repo_root,
            search: semantic.map(|s| s as Arc<dyn Search>),
            store,
            scanner,
            symbols,
            orchestrator,
        }
    }
}
