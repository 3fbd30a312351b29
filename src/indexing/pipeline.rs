//! Data flowing between the indexing stages, and the manifest they leave behind

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::ErrorReport;
use crate::indexer::Chunk;
use crate::symbol::Definition;

/// A file read from disk
#[derive(Debug, Clone)]
pub struct FileContent {
    pub path: PathBuf,
    /// Repository-relative path with `/` separators
    pub relative: String,
    pub content: String,
}

/// Output of the CPU-bound stage for one file
#[derive(Debug, Clone, Default)]
pub struct ProcessedFile {
    pub chunks: Vec<Chunk>,
    pub definitions: Vec<Definition>,
}

/// Counts from one indexing run
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub files_indexed: usize,
    pub chunks_stored: usize,
    pub definitions: usize,
    pub errors: ErrorReport,
    pub elapsed: Duration,
}

/// Written next to the vector store after each run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub indexed_at: DateTime<Utc>,
    pub repo_path: String,
    pub files_indexed: usize,
    pub chunks: usize,
    pub definitions: usize,
    pub errors: usize,
}

impl IndexManifest {
    pub fn from_report(repo_path: &Path, report: &IndexReport) -> Self {
        Self {
            indexed_at: Utc::now(),
            repo_path: repo_path.display().to_string(),
            files_indexed: report.files_indexed,
            chunks: report.chunks_stored,
            definitions: report.definitions,
            errors: report.errors.total_errors,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest to {}", path.display()))
    }

    /// `None` when no run has completed yet
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest from {}", path.display()))?;
        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::ErrorCollector;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db/manifest.json");
        assert!(IndexManifest::load(&path).unwrap().is_none());

        let report = IndexReport {
            files_indexed: 3,
            chunks_stored: 7,
            definitions: 5,
            errors: ErrorCollector::new().get_report(),
            elapsed: Duration::from_millis(20),
        };
        let manifest = IndexManifest::from_report(Path::new("/srv/repo"), &report);
        manifest.save(&path).unwrap();

        let loaded = IndexManifest::load(&path).unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.chunks, 7);
        assert_eq!(loaded.repo_path, "/srv/repo");
    }
}
