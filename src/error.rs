//! Error taxonomy for request-facing operations.
//!
//! Internal plumbing (storage, embeddings, indexing) works with `anyhow`;
//! everything that crosses the HTTP boundary is converted into a [`NavError`]
//! so it can be rendered as a JSON payload with a proper status code.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the request-facing operations.
#[derive(Error, Debug)]
pub enum NavError {
    /// A path or symbol does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is malformed, or the path is neither a file nor a directory.
    #[error("{0}")]
    BadRequest(String),

    /// The path resolves outside of the repository root.
    #[error("{0}")]
    Forbidden(String),

    /// The vector store, embedding model or LLM is not initialized.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The upstream LLM call failed.
    #[error("Error calling language model: {0}")]
    ExternalService(String),

    /// Binary content where text was expected.
    #[error("Cannot decode {0} as text")]
    Decode(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl NavError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            NavError::NotFound(_) => StatusCode::NOT_FOUND,
            NavError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NavError::Forbidden(_) => StatusCode::FORBIDDEN,
            NavError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            NavError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            NavError::Decode(_)
            | NavError::Config(_)
            | NavError::Io(_)
            | NavError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NavError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

// Extractor rejections keep the `{"detail"}` body shape
impl From<JsonRejection> for NavError {
    fn from(rejection: JsonRejection) -> Self {
        NavError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for NavError {
    fn from(rejection: QueryRejection) -> Self {
        NavError::BadRequest(rejection.body_text())
    }
}

pub type NavResult<T> = std::result::Result<T, NavError>;
