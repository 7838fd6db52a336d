//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

/// Standard error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Scan not found (404)
    #[error("Scan not found: {0}")]
    ScanNotFound(Uuid),

    /// Bad request / validation error (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ScanNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = match self {
            ApiError::ScanNotFound(_) => "scan_not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
        };

        tracing::error!(
            error_type = error_type,
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

// ============================================================================
// From conversions for service errors
// ============================================================================

impl From<crate::service::scan::StoreError> for ApiError {
    fn from(err: crate::service::scan::StoreError) -> Self {
        match err {
            crate::service::scan::StoreError::NotFound(id) => ApiError::ScanNotFound(id),
            crate::service::scan::StoreError::Backend(msg) => ApiError::Database(msg),
        }
    }
}

impl From<crate::service::scan::QueueError> for ApiError {
    fn from(err: crate::service::scan::QueueError) -> Self {
        match err {
            crate::service::scan::QueueError::Backend(msg) => ApiError::Database(msg),
        }
    }
}

impl From<crate::service::schedule::ScheduleError> for ApiError {
    fn from(err: crate::service::schedule::ScheduleError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
