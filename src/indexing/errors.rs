//! Per-file error collection for the indexing job

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stage where a file failed
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    FileRead,
    Chunking,
    Embedding,
    Storage,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::FileRead => write!(f, "File Read"),
            ProcessingStage::Chunking => write!(f, "Chunking"),
            ProcessingStage::Embedding => write!(f, "Embedding"),
            ProcessingStage::Storage => write!(f, "Storage"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// Repository-relative path
    pub path: String,
    pub error: String,
    pub stage: ProcessingStage,
}

/// Thread-safe sink shared by the rayon workers and the async stages
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<FileError>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FileError>> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, path: impl Into<String>, error: &anyhow::Error, stage: ProcessingStage) {
        self.lock().push(FileError {
            path: path.into(),
            error: format!("{:#}", error),
            stage,
        });
    }

    pub fn error_count(&self) -> usize {
        self.lock().len()
    }

    pub fn get_report(&self) -> ErrorReport {
        ErrorReport::from_errors(&self.lock())
    }
}

/// Errors grouped by stage
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub total_errors: usize,
    pub by_stage: BTreeMap<ProcessingStage, Vec<FileError>>,
}

impl ErrorReport {
    pub fn from_errors(errors: &[FileError]) -> Self {
        let mut by_stage: BTreeMap<ProcessingStage, Vec<FileError>> = BTreeMap::new();
        for error in errors {
            by_stage.entry(error.stage).or_default().push(error.clone());
        }
        Self {
            total_errors: errors.len(),
            by_stage,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Print up to five examples per stage to stdout
    pub fn print_summary(&self) {
        if !self.has_errors() {
            println!("No errors occurred during indexing");
            return;
        }

        println!("Indexing completed with {} errors", self.total_errors);
        for (stage, errors) in &self.by_stage {
            println!("  {}: {} errors", stage, errors.len());
            for error in errors.iter().take(5) {
                println!("    - {}: {}", error.path, error.error);
            }
            if errors.len() > 5 {
                println!("    ... and {} more", errors.len() - 5);
            }
        }
    }
}
