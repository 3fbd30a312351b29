use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use super::definitions::Definition;
use super::index::SymbolIndex;
use super::tags::read_tags;
use crate::error::NavError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Symbol '{0}' not found in the index")]
    NotFound(String),

    #[error("Ctags index not available. Run indexing first.")]
    IndexUnavailable,
}

impl From<LookupError> for NavError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(_) => NavError::NotFound(err.to_string()),
            LookupError::IndexUnavailable => NavError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// A loaded index together with the summary derived from it
#[derive(Debug)]
pub struct LoadedSymbols {
    pub index: SymbolIndex,
    pub summary: String,
}

/// Process-wide symbol index loaded from the tag file.
///
/// Populated with [`SymbolCache::rebuild`] before serving. A lookup that finds
/// the cache empty makes one rebuild attempt of its own.
pub struct SymbolCache {
    tags_path: PathBuf,
    summary_max_chars: usize,
    loaded: RwLock<Option<Arc<LoadedSymbols>>>,
}

impl SymbolCache {
    pub fn new(tags_path: impl Into<PathBuf>, summary_max_chars: usize) -> Self {
        Self {
            tags_path: tags_path.into(),
            summary_max_chars,
            loaded: RwLock::new(None),
        }
    }

    pub fn tags_path(&self) -> &Path {
        &self.tags_path
    }

    /// Reload the tag file and swap in the new index; returns the symbol count
    pub fn rebuild(&self) -> Result<usize> {
        let definitions = read_tags(&self.tags_path)?;
        let index = SymbolIndex::from_definitions(definitions);
        let summary = index.summary(self.summary_max_chars);
        let count = index.symbol_count();

        info!(
            symbols = count,
            files = index.file_count(),
            path = %self.tags_path.display(),
            "Loaded symbol index"
        );

        let mut slot = self.loaded.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(LoadedSymbols { index, summary }));
        Ok(count)
    }

    /// Current index, if one has been loaded
    pub fn snapshot(&self) -> Option<Arc<LoadedSymbols>> {
        self.loaded
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Current index, loading it first if necessary
    pub fn ensure_loaded(&self) -> Result<Arc<LoadedSymbols>, LookupError> {
        if let Some(loaded) = self.snapshot() {
            return Ok(loaded);
        }
        if let Err(e) = self.rebuild() {
            warn!(error = %e, "Symbol index unavailable");
            return Err(LookupError::IndexUnavailable);
        }
        self.snapshot().ok_or(LookupError::IndexUnavailable)
    }

    pub fn lookup(&self, name: &str) -> Result<Vec<Definition>, LookupError> {
        let loaded = self.ensure_loaded()?;
        let definitions = loaded.index.lookup(name);
        if definitions.is_empty() {
            return Err(LookupError::NotFound(name.to_string()));
        }
        Ok(definitions.to_vec())
    }

    /// Codebase summary; empty when no index can be loaded
    pub fn summary(&self) -> String {
        self.ensure_loaded()
            .map(|loaded| loaded.summary.clone())
            .unwrap_or_default()
    }

    pub fn symbol_count(&self) -> usize {
        self.snapshot()
            .map(|loaded| loaded.index.symbol_count())
            .unwrap_or(0)
    }
}
