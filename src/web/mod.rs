//! HTTP surface: browse, search, query and definition lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use codenav::web::{AppState, WebServer};
//!
//! let server = WebServer::new(state);
//! server.start("127.0.0.1", 8000).await?;
//! ```

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self, host: &str, port: u16) -> Result<()> {
        let addr = format!("{}:{}", host, port);

        // Browser frontends are served from another origin
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = routes::create_router(self.state).layer(cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        info!(addr = %addr, "Code navigator listening");

        axum::serve(listener, app)
            .await
            .context("Web server failed")?;

        Ok(())
    }
}
