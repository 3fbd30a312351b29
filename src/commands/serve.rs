use anyhow::Result;
use tracing::{info, warn};

use super::build_state;
use crate::config::Config;
use crate::web::WebServer;

/// Load the symbol index, then serve HTTP until stopped
pub async fn run(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let root = config.repo_root()?;
    let host = config.server.host.clone();
    let port = config.server.port;

    let state = build_state(config, root).await;

    let symbols = state.symbols.clone();
    match tokio::task::spawn_blocking(move || symbols.rebuild()).await? {
        Ok(count) => info!(symbols = count, "Symbol index ready"),
        Err(e) => warn!(error = %format!("{:#}", e), "Symbol index not loaded; run `codenav index`"),
    }

    info!(
        semantic_search = state.search.is_some(),
        question_answering = state.orchestrator.is_configured(),
        "Services initialized"
    );

    WebServer::new(state).start(&host, port).await
}
