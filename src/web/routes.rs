use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/browse", get(handlers::browse_root))
        .route("/browse/", get(handlers::browse_root))
        .route("/browse/{*path}", get(handlers::browse_entry))
        .route(
            "/search",
            post(handlers::semantic_search).get(handlers::scan_search),
        )
        .route("/query", post(handlers::answer_question))
        .route("/index/definition/{symbol}", get(handlers::definition))
        .route("/index/reload", post(handlers::reload_index))
        .route("/config", get(handlers::config))
        .route("/api/stats", get(handlers::stats))
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
}
