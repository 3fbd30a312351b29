use anyhow::Result;
use tracing::info;

use super::open_search_backend;
use crate::config::Config;
use crate::indexing::ParallelIndexer;

/// Rebuild the vector store, tag file and manifest from scratch
pub async fn run(config: Config, quiet: bool) -> Result<()> {
    let root = config.repo_root()?;
    let (embedder, store) = open_search_backend(&config).await?;

    info!(root = %root.display(), db = %config.db_path().display(), "Indexing repository");

    let indexer = ParallelIndexer::new(root.clone(), config, store, embedder)?.with_progress(!quiet);
    let report = indexer.run().await?;

    println!("Repository: {}", root.display());
    println!(
        "Indexed {} files ({} chunks, {} definitions) in {:.2}s",
        report.files_indexed,
        report.chunks_stored,
        report.definitions,
        report.elapsed.as_secs_f64()
    );
    report.errors.print_summary();

    Ok(())
}
