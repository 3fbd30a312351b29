use anyhow::Result;
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use codenav::embeddings::{EmbeddingProvider, MockEmbedder};
use codenav::indexing::{IndexReport, ParallelIndexer};
use codenav::llm::LanguageModel;
use codenav::storage::{MemoryStore, VectorStore};
use codenav::web::{create_router, AppState};
use codenav::Config;

use super::OfflineStore;

pub const TEST_DIMENSION: usize = 64;

/// A throwaway repository plus database directory, indexed in memory
pub struct TestHarness {
    pub repo_dir: TempDir,
    pub db_dir: TempDir,
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<MockEmbedder>,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        let repo_dir = TempDir::new()?;
        let db_dir = TempDir::new()?;

        let mut config = Config::default();
        config.repository.path = Some(repo_dir.path().to_path_buf());
        config.storage.db_path = db_dir.path().join("codenav_db");
        config.embeddings.batch_size = 4;

        Ok(Self {
            repo_dir,
            db_dir,
            config,
            store: Arc::new(MemoryStore::new()),
            embedder: Arc::new(MockEmbedder::new(TEST_DIMENSION)),
        })
    }

    pub fn create_test_file(&self, path: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.repo_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn repo_path(&self) -> &Path {
        self.repo_dir.path()
    }

    pub async fn index(&self) -> Result<IndexReport> {
        ParallelIndexer::new(
            self.repo_path().to_path_buf(),
            self.config.clone(),
            self.store.clone(),
            self.embedder.clone(),
        )?
        .with_progress(false)
        .run()
        .await
    }

    /// State with semantic search over the in-memory store
    pub fn state(&self, llm: Option<Arc<dyn LanguageModel>>) -> AppState {
        AppState::new(
            self.config.clone(),
            self.repo_path().to_path_buf(),
            Some(self.store.clone() as Arc<dyn VectorStore>),
            Some(self.embedder.clone() as Arc<dyn EmbeddingProvider>),
            llm,
        )
    }

    /// State as served when the vector store or embedding model failed to load
    pub fn degraded_state(&self) -> AppState {
        AppState::new(
            self.config.clone(),
            self.repo_path().to_path_buf(),
            None,
            None,
            None,
        )
    }

    /// State whose vector store fails every call
    pub fn offline_state(&self) -> AppState {
        AppState::new(
            self.config.clone(),
            self.repo_path().to_path_buf(),
            Some(Arc::new(OfflineStore) as Arc<dyn VectorStore>),
            Some(self.embedder.clone() as Arc<dyn EmbeddingProvider>),
            None,
        )
    }

    pub fn router(&self, llm: Option<Arc<dyn LanguageModel>>) -> Router {
        create_router(self.state(llm))
    }
}
