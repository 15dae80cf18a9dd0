//! Request error taxonomy and its HTTP mapping

use crate::auth::AuthRejection;
use crate::upstream::UpstreamError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Anti-forgery verification failed
    #[error(transparent)]
    AuthRejected(#[from] AuthRejection),

    /// Malformed entity identifier or request
    #[error("{0}")]
    Validation(String),

    /// The upstream API has no such item
    #[error("{0}")]
    NotFound(String),

    /// The upstream API could not be reached or answered badly
    #[error("Failed to contact upstream API: {0}")]
    UpstreamUnavailable(String),

    /// Persistence failure
    #[error("Database error")]
    Storage(#[from] sqlx::Error),
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::AuthRejected(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuthRejected(rejection) => rejection.code(),
            Self::Validation(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::NotFound => Self::NotFound("Video not found or private".to_string()),
            UpstreamError::Unavailable(reason) => Self::UpstreamUnavailable(reason),
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(e) => tracing::error!(error = %e, "Storage failure"),
            Self::UpstreamUnavailable(reason) => tracing::warn!(%reason, "Upstream failure"),
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}
