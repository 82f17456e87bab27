//! Error types for the website analyzer.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for the analysis pipeline
//! - `FetchError` / `ExtractionError`: failures of a single acquisition or parse step
//! - `ApiError`: Wrapper for HTTP handler errors (serializable as `{ "error": ... }`)
//! - `Result<T>`: Type alias for Results using AppError

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// PIPELINE ERROR TYPES
// ============================================================================

/// Failure while acquiring raw data for one URL.
///
/// Expected absences (a missing robots.txt, a 404 sitemap) are not errors;
/// these variants cover the network itself going wrong.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Top-level navigation answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Browser error: {0}")]
    Browser(String),

    /// External service error (PageSpeed, etc.)
    #[error("Service error ({service}): {message}")]
    Service { service: &'static str, message: String },
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    pub fn service(service: &'static str, msg: impl Into<String>) -> Self {
        Self::Service { service, message: msg.into() }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout { after_ms: after.as_millis() as u64 }
    }

    /// Classify a reqwest failure. `timeout` is the limit the client was built with.
    pub fn from_reqwest(error: reqwest::Error, timeout: std::time::Duration) -> Self {
        if error.is_timeout() {
            return Self::timeout(timeout);
        }
        match error.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Network(error.to_string()),
        }
    }
}

/// Parse failure on an otherwise successful fetch.
///
/// Callers substitute neutral defaults instead of aborting the analysis.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("Malformed audit report: {0}")]
    MalformedAudit(String),

    #[error("In-page script failed: {0}")]
    Script(String),
}

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for analysis operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input could not be normalized to an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Anything unexpected escaping a single URL's pipeline
    #[error("Analysis pipeline failed: {0}")]
    Pipeline(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_url(input: impl Into<String>) -> Self {
        Self::InvalidUrl(input.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }
}

/// Result type alias using AppError.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// ============================================================================
// API ERROR (FOR AXUM HANDLERS)
// ============================================================================

/// Error returned from HTTP handlers, rendered as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("[API] {}", self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::InvalidUrl(_) => Self::BadRequest(error.to_string()),
            other => Self::Internal(format!("{:#}", anyhow::Error::from(other))),
        }
    }
}
