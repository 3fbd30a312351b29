use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NavError, NavResult};

const CONFIG_FILE: &str = "codenav.toml";
const TAGS_FILE: &str = "tags.json";
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Root of the repository to browse and index
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// File extensions to index (without the leading dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped anywhere in the tree
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// Respect .gitignore files while walking
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Files larger than this are skipped (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Chunk window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive windows in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excluded_dirs: default_excluded_dirs(),
            respect_gitignore: true,
            max_file_size: default_max_file_size(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    [
        "py", "js", "jsx", "ts", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs", "php",
        "rb", "swift", "kt", "sh", "html", "css", "scss", "sql", "md", "json", "xml", "yaml",
        "yml",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_excluded_dirs() -> Vec<String> {
    ["node_modules", "venv", "env", "dist", "build", "__pycache__", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size() -> u64 {
    1_000_000
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local ONNX model through fastembed
    #[default]
    FastEmbed,
    /// Deterministic hash vectors; no model download
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Number of chunks embedded and stored per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_model(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the vector database, tag file and manifest
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("codenav_db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Ranking and scanning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight of the semantic component (1 - cosine distance)
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight of the keyword overlap component
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Maximum number of ranked results
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Candidates pulled from the vector store before ranking
    #[serde(default = "default_candidates")]
    pub candidates: usize,

    /// Documents longer than this get a snippet window instead of full text
    #[serde(default = "default_snippet_threshold")]
    pub snippet_threshold: usize,

    /// Characters kept before the first match
    #[serde(default = "default_snippet_before")]
    pub snippet_before: usize,

    /// Characters kept from the first match onwards
    #[serde(default = "default_snippet_after")]
    pub snippet_after: usize,

    /// Matching files after which a repository scan stops
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            max_results: default_max_results(),
            candidates: default_candidates(),
            snippet_threshold: default_snippet_threshold(),
            snippet_before: default_snippet_before(),
            snippet_after: default_snippet_after(),
            scan_limit: default_scan_limit(),
        }
    }
}

fn default_semantic_weight() -> f32 {
    0.6
}

fn default_keyword_weight() -> f32 {
    0.4
}

fn default_max_results() -> usize {
    10
}

fn default_candidates() -> usize {
    10
}

fn default_snippet_threshold() -> usize {
    500
}

fn default_snippet_before() -> usize {
    150
}

fn default_snippet_after() -> usize {
    350
}

fn default_scan_limit() -> usize {
    100
}

/// Language model configuration (any OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL of the chat completions API
    #[serde(default = "default_llm_base_url")]
    pub base_url: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Retrieved chunks added to the prompt
    #[serde(default = "default_context_snippets")]
    pub context_snippets: usize,

    /// Upper bound for the codebase summary included in every prompt
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key_env: default_api_key_env(),
            context_snippets: default_context_snippets(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_llm_base_url() -> Option<String> {
    Some("https://generativelanguage.googleapis.com/v1beta/openai".to_string())
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_context_snippets() -> usize {
    5
}

fn default_summary_max_chars() -> usize {
    20_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable the rolling file log
    #[serde(default)]
    pub enabled: bool,

    /// Log to stderr
    #[serde(default = "default_true")]
    pub stderr: bool,

    /// Level of the file log
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory of the file log (relative paths resolve against the working directory)
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_log_rotation")]
    pub rotation: String,

    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stderr: true,
            level: default_log_level(),
            directory: default_log_directory(),
            rotation: default_log_rotation(),
            file_prefix: default_log_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

fn default_log_prefix() -> String {
    "codenav.log".to_string()
}

impl Config {
    /// Load configuration from `codenav.toml` in `dir`, falling back to defaults
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_file(&dir.join(CONFIG_FILE))
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_file(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration as `codenav.toml` in `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        let config_path = dir.join(CONFIG_FILE);

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Apply `REPO_PATH`, `CODENAV_DB_PATH`, `HOST` and `PORT` overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(repo) = std::env::var("REPO_PATH") {
            if !repo.trim().is_empty() {
                self.repository.path = Some(PathBuf::from(repo));
            }
        }
        if let Ok(db) = std::env::var("CODENAV_DB_PATH") {
            if !db.trim().is_empty() {
                self.storage.db_path = PathBuf::from(db);
            }
        }
        if let Ok(host) = std::env::var("HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        Ok(())
    }

    /// The configured repository root; required by every command
    pub fn repo_root(&self) -> NavResult<PathBuf> {
        let Some(path) = self.repository.path.as_ref() else {
            return Err(NavError::Config(
                "Repository path is not configured. Set REPO_PATH or [repository].path in codenav.toml"
                    .to_string(),
            ));
        };
        if !path.is_dir() {
            return Err(NavError::Config(format!(
                "Repository path not found: {}",
                path.display()
            )));
        }
        Ok(path.clone())
    }

    /// Directory of the vector database
    pub fn db_path(&self) -> &Path {
        &self.storage.db_path
    }

    /// Location of the ctags-compatible tag file written by the indexer
    pub fn tags_path(&self) -> PathBuf {
        self.storage.db_path.join(TAGS_FILE)
    }

    /// Location of the manifest written after each indexing run
    pub fn manifest_path(&self) -> PathBuf {
        self.storage.db_path.join(MANIFEST_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.indexer.extensions.contains(&"py".to_string()));
        assert!(config.indexer.excluded_dirs.contains(&"node_modules".to_string()));
        assert_eq!(config.indexer.chunk_size, 500);
        assert_eq!(config.indexer.chunk_overlap, 50);
        assert_eq!(config.embeddings.model, "all-MiniLM-L6-v2");
        assert!((config.search.semantic_weight - 0.6).abs() < 0.001);
        assert!((config.search.keyword_weight - 0.4).abs() < 0.001);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.scan_limit, 100);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.api_key_env, "GOOGLE_API_KEY");
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.indexer.chunk_size = 800;
        config.repository.path = Some(PathBuf::from("/srv/repo"));

        config.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();

        assert_eq!(loaded.indexer.chunk_size, 800);
        assert_eq!(loaded.repository.path, Some(PathBuf::from("/srv/repo")));
        assert_eq!(config.indexer.extensions, loaded.indexer.extensions);
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.indexer.chunk_size, 500);
        assert!(config.repository.path.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            max_results = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.snippet_before, 150);
        assert_eq!(config.indexer.chunk_overlap, 50);
    }

    #[test]
    fn test_repo_root_required() {
        let config = Config::default();
        let err = config.repo_root().unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
        assert!(err.to_string().contains("REPO_PATH"));
    }

    #[test]
    fn test_repo_root_must_exist() {
        let mut config = Config::default();
        config.repository.path = Some(PathBuf::from("/definitely/not/a/real/dir"));
        assert!(matches!(config.repo_root(), Err(NavError::Config(_))));

        let dir = tempdir().unwrap();
        config.repository.path = Some(dir.path().to_path_buf());
        assert_eq!(config.repo_root().unwrap(), dir.path());
    }

    #[test]
    fn test_derived_paths() {
        let mut config = Config::default();
        config.storage.db_path = PathBuf::from("/tmp/nav");
        assert_eq!(config.tags_path(), PathBuf::from("/tmp/nav/tags.json"));
        assert_eq!(config.manifest_path(), PathBuf::from("/tmp/nav/manifest.json"));
    }
}
