use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codenav")]
#[command(author, version, about = "Code navigator backend: browse, search and ask questions about a repository")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ./codenav.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the vector store and tag file for the repository
    Index {
        /// Hide the progress bars
        #[arg(long)]
        quiet: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Address to bind (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Semantic search over the indexed chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Look up where a symbol is defined
    Define {
        /// Symbol name
        symbol: String,
    },

    /// Ask the language model a question about the repository
    Ask {
        /// The question
        question: String,

        /// Repository-relative file to include as extra context
        #[arg(short, long)]
        file: Option<String>,
    },
}
