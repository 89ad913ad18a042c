//! Error types for jukebox-server
//!
//! `StoreError` is what the queue store and search provider report;
//! `ApiError` is what handlers return, mapped onto HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Queue store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing or empty required field
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record with this id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network failure or non-2xx response from the remote store
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// HTTP status returned by the store (None for transport failures)
        status: Option<u16>,
        message: String,
        /// Response body returned by the store, if any
        detail: Option<String>,
    },

    /// Local database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store answered with something we could not decode
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
            detail: None,
        }
    }
}

/// Search provider errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Failed to parse search results: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Request(e.to_string())
    }
}

/// Handler error, rendered as `{"error": ..., "detail"?: ...}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Generic 500 with a fixed, operator-readable message
    pub fn server_error(message: impl Into<String>) -> Self {
        ApiError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            detail: None,
        }
    }

    /// Map a store failure for a route
    ///
    /// Validation failures are always 400. With `propagate_status`, the
    /// store's own status code is passed through (NotFound becomes 404);
    /// otherwise everything else is a 500.
    pub fn from_store(err: StoreError, message: &str, propagate_status: bool) -> Self {
        let status = match (&err, propagate_status) {
            (StoreError::Validation(msg), _) => return ApiError::BadRequest(msg.clone()),
            (StoreError::NotFound(_), true) => StatusCode::NOT_FOUND,
            (StoreError::Unavailable { status: Some(code), .. }, true) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match err {
            StoreError::Unavailable { detail: Some(body), .. } => Some(body),
            other => Some(other.to_string()),
        };

        ApiError::Upstream {
            status,
            message: message.to_string(),
            detail,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) => json!({ "error": message }),
            ApiError::Upstream { message, detail: Some(detail), .. } => {
                json!({ "error": message, "detail": detail })
            }
            ApiError::Upstream { message, detail: None, .. } => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
