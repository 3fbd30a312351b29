pub mod browse;
pub mod cli;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod indexer;
pub mod indexing;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod search;
pub mod storage;
pub mod symbol;
pub mod web;

pub use config::Config;
pub use error::{NavError, NavResult};
