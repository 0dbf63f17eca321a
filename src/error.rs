use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Failure reported by a geocoding provider for a single request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider rate limited the request")]
    RateLimited,

    #[error("provider returned server error {0}")]
    Server(u16),

    #[error("provider rejected the request with status {0}")]
    Client(u16),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited
                | ProviderError::Server(_)
                | ProviderError::Timeout
                | ProviderError::Network(_)
        )
    }
}

/// Why a resolution produced no result. Collapsed to `None` at the
/// resolver's public boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("empty address")]
    EmptyAddress,

    #[error("coordinate out of range")]
    InvalidCoordinate,

    #[error("provider returned no usable result")]
    NoResult,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: ProviderError },

    #[error("permanent provider failure: {0}")]
    Permanent(ProviderError),
}

impl ResolveError {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ResolveError::EmptyAddress | ResolveError::InvalidCoordinate => "invalid_input",
            ResolveError::NoResult => "no_result",
            ResolveError::Exhausted { .. } => "exhausted",
            ResolveError::Permanent(_) => "permanent_failure",
        }
    }
}
