//! Error handling

use std::time::Duration;

use axum::{
    extract::rejection::QueryRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Request-level errors, rendered as the HTTP response
#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Validation errors
    ValidationError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::ValidationError(err.body_text())
    }
}

/// Failure of a single provider lookup.
///
/// Never crosses the endpoint boundary: it is rendered into the provider's
/// slot with [`ProviderError::to_marker`].
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing API key ({0})")]
    MissingApiKey(&'static str),

    #[error("{provider} does not support {kind} queries")]
    UnsupportedQuery {
        provider: &'static str,
        kind: &'static str,
    },

    #[error("upstream rejected credentials")]
    Unauthorized,

    #[error("indicator not found upstream")]
    NotFound,

    #[error("upstream rate limit exceeded")]
    RateLimited,

    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("lookup aborted: {0}")]
    Aborted(String),
}

impl ProviderError {
    /// Error marker placed in the provider's slot of an aggregate response
    pub fn to_marker(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}
