//! HTTP request handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::state::AppState;
use crate::browse::{browse, BrowseEntry};
use crate::error::{NavError, NavResult};
use crate::indexing::IndexManifest;
use crate::metrics::{self, SYMBOL_LOOKUPS};
use crate::search::{ScanRequest, Search, SearchHit};
use crate::symbol::{Definition, LookupError};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

/// Query string of `GET /search`
#[derive(Debug, Deserialize)]
pub struct ScanParams {
    pub q: String,
    pub ext: Option<String>,
    pub dir: Option<String>,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub exact: bool,
}

impl From<ScanParams> for ScanRequest {
    fn from(params: ScanParams) -> Self {
        ScanRequest {
            query: params.q,
            ext: params.ext,
            dir: params.dir,
            content: params.code,
            exact: params.exact,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub context_file_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct DefinitionsResponse {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub symbols: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub repo_path: String,
    /// `None` when the vector store is unavailable
    pub chunks: Option<usize>,
    pub symbols: usize,
    /// Summary of the last indexing run, if any
    pub manifest: Option<IndexManifest>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Code Navigator Backend Ready" }))
}

/// GET /browse/
pub async fn browse_root(State(state): State<AppState>) -> NavResult<Json<BrowseEntry>> {
    browse_path(state, String::new()).await
}

/// GET /browse/{*path}
pub async fn browse_entry(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> NavResult<Json<BrowseEntry>> {
    browse_path(state, path).await
}

async fn browse_path(state: AppState, path: String) -> NavResult<Json<BrowseEntry>> {
    let root = state.repo_root.clone();
    let entry = tokio::task::spawn_blocking(move || browse(&root, &path))
        .await
        .map_err(|e| NavError::Internal(format!("Browse task failed: {}", e)))??;
    Ok(Json(entry))
}

/// POST /search
pub async fn semantic_search(
    State(state): State<AppState>,
    request: Result<Json<SearchRequest>, JsonRejection>,
) -> NavResult<Json<Vec<SearchHit>>> {
    let Json(request) = request?;
    let search = state.search.as_ref().ok_or_else(|| {
        NavError::ServiceUnavailable(
            "Search functionality is not available. Vector store or embedding model not initialized."
                .to_string(),
        )
    })?;

    if request.query.trim().is_empty() {
        return Err(NavError::BadRequest("Query must not be empty".to_string()));
    }

    let limit = request
        .limit
        .unwrap_or(state.config.search.max_results)
        .max(1);

    let hits = search.search(&request.query, limit).await.map_err(|e| {
        error!(error = %e, "Search failed");
        NavError::ServiceUnavailable(format!("Search functionality is not available: {:#}", e))
    })?;

    Ok(Json(hits))
}

/// GET /search
pub async fn scan_search(
    State(state): State<AppState>,
    params: Result<Query<ScanParams>, QueryRejection>,
) -> NavResult<Json<Vec<SearchHit>>> {
    let Query(params) = params?;
    let request = ScanRequest::from(params);
    let scanner = state.scanner.clone();
    let hits = tokio::task::spawn_blocking(move || scanner.scan(&request))
        .await
        .map_err(|e| NavError::Internal(format!("Scan task failed: {}", e)))??;
    Ok(Json(hits))
}

/// POST /query
pub async fn answer_question(
    State(state): State<AppState>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> NavResult<Json<QueryResponse>> {
    let Json(request) = request?;
    let answer = state
        .orchestrator
        .answer(&request.question, request.context_file_path.as_deref())
        .await?;
    Ok(Json(QueryResponse { answer }))
}

/// GET /index/definition/{symbol}
pub async fn definition(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> NavResult<Json<DefinitionsResponse>> {
    let symbols = state.symbols.clone();
    let name = symbol.clone();
    let result = tokio::task::spawn_blocking(move || symbols.lookup(&name))
        .await
        .map_err(|e| NavError::Internal(format!("Lookup task failed: {}", e)))?;

    let outcome = match &result {
        Ok(_) => "found",
        Err(LookupError::NotFound(_)) => "not_found",
        Err(LookupError::IndexUnavailable) => "unavailable",
    };
    SYMBOL_LOOKUPS.with_label_values(&[outcome]).inc();

    let definitions = result?;
    info!(symbol = %symbol, count = definitions.len(), "Resolved definition");
    Ok(Json(DefinitionsResponse { definitions }))
}

/// POST /index/reload
pub async fn reload_index(State(state): State<AppState>) -> NavResult<Json<ReloadResponse>> {
    let symbols = state.symbols.clone();
    let count = tokio::task::spawn_blocking(move || symbols.rebuild())
        .await
        .map_err(|e| NavError::Internal(format!("Reload task failed: {}", e)))?
        .map_err(|e| {
            warn!(error = %e, "Symbol index reload failed");
            NavError::from(LookupError::IndexUnavailable)
        })?;
    Ok(Json(ReloadResponse { symbols: count }))
}

/// GET /config
pub async fn config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "repo_path": state.repo_root.display().to_string() }))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let chunks = match &state.store {
        Some(store) => match store.count().await {
            Ok(count) => Some(count),
            Err(e) => {
                error!(error = %e, "Failed to count chunks");
                None
            }
        },
        None => None,
    };

    let manifest = IndexManifest::load(&state.config.manifest_path()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load index manifest");
        None
    });

    Json(StatsResponse {
        repo_path: state.repo_root.display().to_string(),
        chunks,
        symbols: state.symbols.symbol_count(),
        manifest,
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    let output = metrics::gather_metrics();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output)
}
