//! The offline indexing job: walk, read, chunk and scan in parallel with
//! rayon, then embed and store in sequential batches.

use anyhow::{bail, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::indexer::{relative_path, Chunk, Chunker, Walker};
use crate::metrics::{INDEXED_CHUNKS, INDEXED_FILES, INDEX_ERRORS, INDEX_LATENCY};
use crate::storage::{EmbeddingRecord, VectorStore};
use crate::symbol::{write_tags, ScannerRegistry};

use super::errors::{ErrorCollector, ProcessingStage};
use super::pipeline::{FileContent, IndexManifest, IndexReport, ProcessedFile};

pub struct ParallelIndexer {
    root: PathBuf,
    config: Config,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Chunker,
    scanners: ScannerRegistry,
    error_collector: ErrorCollector,
    show_progress: bool,
}

impl ParallelIndexer {
    pub fn new(
        root: PathBuf,
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let chunker = Chunker::from_config(&config.indexer).context("Invalid chunking settings")?;
        Ok(Self {
            root,
            config,
            store,
            embedder,
            chunker,
            scanners: ScannerRegistry::with_defaults(),
            error_collector: ErrorCollector::new(),
            show_progress: true,
        })
    }

    /// Replace the definition scanners
    pub fn with_scanners(mut self, scanners: ScannerRegistry) -> Self {
        self.scanners = scanners;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Rebuild the vector store, tag file and manifest from scratch
    pub async fn run(&self) -> Result<IndexReport> {
        let start = Instant::now();

        if !self.root.is_dir() {
            bail!("Repository path not found: {}", self.root.display());
        }

        info!(
            root = %self.root.display(),
            store = self.store.backend_name(),
            embedder = self.embedder.provider_name(),
            "Starting indexing"
        );

        self.store
            .rebuild()
            .await
            .context("Failed to reset the vector store")?;

        let root = self.root.clone();
        let indexer_config = self.config.indexer.clone();
        let files = tokio::task::spawn_blocking(move || {
            Walker::new(root, &indexer_config).collect_files()
        })
        .await
        .context("File walk task failed")?;

        info!(files = files.len(), "Found files to index");

        let multi = MultiProgress::new();
        if !self.show_progress {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        let file_pb = create_progress_bar(&multi, files.len(), "Files");
        let chunk_pb = create_progress_bar(&multi, 0, "Chunks");

        let contents = self.read_files_parallel(files, &file_pb).await?;
        let files_indexed = contents.len();

        file_pb.set_message("Chunking and scanning...");
        let processed = self.process_files_parallel(contents).await?;
        file_pb.finish_with_message("Complete");

        let mut chunks = Vec::new();
        let mut definitions = Vec::new();
        for file in processed {
            chunks.extend(file.chunks);
            definitions.extend(file.definitions);
        }
        chunk_pb.set_length(chunks.len() as u64);

        let chunks_stored = self.embed_and_store(chunks, &chunk_pb).await?;
        chunk_pb.finish_with_message("Complete");

        let tags_path = self.config.tags_path();
        write_tags(&tags_path, &definitions).context("Failed to write tag file")?;

        let report = IndexReport {
            files_indexed,
            chunks_stored,
            definitions: definitions.len(),
            errors: self.error_collector.get_report(),
            elapsed: start.elapsed(),
        };

        IndexManifest::from_report(&self.root, &report).save(&self.config.manifest_path())?;

        INDEXED_FILES.set(report.files_indexed as f64);
        INDEXED_CHUNKS.set(report.chunks_stored as f64);
        INDEX_ERRORS.inc_by(report.errors.total_errors as f64);
        INDEX_LATENCY.observe(report.elapsed.as_secs_f64());

        info!(
            files = report.files_indexed,
            chunks = report.chunks_stored,
            definitions = report.definitions,
            errors = report.errors.total_errors,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Indexing completed"
        );

        Ok(report)
    }

    async fn read_files_parallel(
        &self,
        files: Vec<PathBuf>,
        progress: &ProgressBar,
    ) -> Result<Vec<FileContent>> {
        let root = self.root.clone();
        let error_collector = self.error_collector.clone();
        let pb = progress.clone();

        let contents = tokio::task::spawn_blocking(move || {
            files
                .par_iter()
                .filter_map(|path| {
                    let relative = relative_path(&root, path);
                    let result = std::fs::read(path);
                    pb.inc(1);
                    match result {
                        Ok(bytes) => Some(FileContent {
                            path: path.clone(),
                            relative,
                            content: String::from_utf8_lossy(&bytes).into_owned(),
                        }),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Failed to read file");
                            error_collector.record(
                                relative,
                                &anyhow::Error::new(e),
                                ProcessingStage::FileRead,
                            );
                            None
                        }
                    }
                })
                .collect::<Vec<_>>()
        })
        .await
        .context("File read task failed")?;

        Ok(contents)
    }

    async fn process_files_parallel(&self, files: Vec<FileContent>) -> Result<Vec<ProcessedFile>> {
        let chunker = self.chunker;
        let scanners = self.scanners.clone();
        let error_collector = self.error_collector.clone();

        let processed = tokio::task::spawn_blocking(move || {
            files
                .par_iter()
                .map(|file| {
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| ProcessedFile {
                        chunks: chunker.chunks(&file.relative, &file.content).collect(),
                        definitions: scanners.scan(&file.relative, &file.content),
                    }));
                    result.unwrap_or_else(|_| {
                        error_collector.record(
                            file.relative.clone(),
                            &anyhow::anyhow!("Panic while chunking {}", file.path.display()),
                            ProcessingStage::Chunking,
                        );
                        ProcessedFile::default()
                    })
                })
                .collect::<Vec<_>>()
        })
        .await
        .context("Chunking task failed")?;

        Ok(processed)
    }

    /// Embed and upsert in batches; a failed batch is recorded and skipped
    async fn embed_and_store(&self, chunks: Vec<Chunk>, progress: &ProgressBar) -> Result<usize> {
        let batch_size = self.config.embeddings.batch_size.max(1);
        let mut stored = 0;

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            let vectors = match self.embedder.embed(&texts).await {
                Ok(vectors) if vectors.len() == batch.len() => vectors,
                Ok(vectors) => {
                    let err = anyhow::anyhow!(
                        "Embedding count {} doesn't match chunk count {}",
                        vectors.len(),
                        batch.len()
                    );
                    self.record_batch(batch, &err, ProcessingStage::Embedding);
                    progress.inc(batch.len() as u64);
                    continue;
                }
                Err(e) => {
                    error!(error = %e, size = batch.len(), "Failed to embed batch");
                    self.record_batch(batch, &e, ProcessingStage::Embedding);
                    progress.inc(batch.len() as u64);
                    continue;
                }
            };

            let records: Vec<EmbeddingRecord> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddingRecord { chunk, vector })
                .collect();

            match self.store.upsert(records).await {
                Ok(()) => stored += batch.len(),
                Err(e) => {
                    error!(error = %e, size = batch.len(), "Failed to store batch");
                    self.record_batch(batch, &e, ProcessingStage::Storage);
                }
            }
            progress.inc(batch.len() as u64);
        }

        Ok(stored)
    }

    /// One error entry per distinct file in the batch
    fn record_batch(&self, batch: &[Chunk], error: &anyhow::Error, stage: ProcessingStage) {
        let files: BTreeSet<&str> = batch.iter().map(|c| c.file_path.as_str()).collect();
        for file in files {
            self.error_collector.record(file, error, stage);
        }
    }
}

fn create_progress_bar(multi: &MultiProgress, total: usize, label: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new(total as u64));
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] {}: [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{msg}}",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
