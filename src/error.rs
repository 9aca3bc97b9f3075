//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache service.
///
/// `Decode` never reaches callers of [`crate::cache::CacheService::get`]; a
/// corrupt entry is evicted and reported as a miss instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be serialized or compressed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Stored bytes could not be decompressed or deserialized
    #[error("Decode error: {0}")]
    Decode(String),

    /// The wrapped operation failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Key not found in cache (or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Encode(_) => StatusCode::BAD_REQUEST,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Decode(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
