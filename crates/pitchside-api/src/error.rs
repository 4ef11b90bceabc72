//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Engine error: {0}")]
    Engine(#[from] pitchside_engine::EngineError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] pitchside_firestore::FirestoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] pitchside_cache::CacheError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Backend trouble is retriable; tell the client to come back.
            ApiError::Engine(_) | ApiError::Firestore(_) | ApiError::Cache(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Engine(e) => e.is_retryable(),
            ApiError::Firestore(e) => e.is_retryable(),
            ApiError::Cache(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retriable: Option<bool>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose backend error details in production
        let detail = match &self {
            ApiError::Internal(_)
            | ApiError::Engine(_)
            | ApiError::Firestore(_)
            | ApiError::Cache(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let retriable = (status == StatusCode::SERVICE_UNAVAILABLE).then(|| self.is_retryable());
        let body = ErrorResponse { detail, retriable };

        (status, Json(body)).into_response()
    }
}
