use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use codenav::cli::{Cli, Commands};
use codenav::config::Config;
use codenav::logging::{init_early_logging, init_logging};
use codenav::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    // .env.local wins over .env; neither overrides the real environment
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let loaded = match &cli.config {
        Some(path) => Config::load_file(path),
        None => Config::load(&working_dir),
    }
    .and_then(|mut config| config.apply_env().map(|_| config));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            init_early_logging();
            tracing::error!(error = %format!("{:#}", e), "Failed to load configuration");
            return Err(e);
        }
    };

    // The guard must live until exit so buffered logs are flushed
    let _logging_guard = init_logging(&config.logging, &working_dir)?;

    tracing::info!("codenav starting up");
    metrics::register_metrics();

    match cli.command {
        Commands::Index { quiet } => {
            codenav::commands::index::run(config, quiet).await?;
        }
        Commands::Serve { host, port } => {
            codenav::commands::serve::run(config, host, port).await?;
        }
        Commands::Search { query, limit } => {
            codenav::commands::search::run(config, &query, limit).await?;
        }
        Commands::Define { symbol } => {
            codenav::commands::define::run(config, &symbol).await?;
        }
        Commands::Ask { question, file } => {
            codenav::commands::ask::run(config, &question, file.as_deref()).await?;
        }
    }

    Ok(())
}
