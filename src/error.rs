//! Unified application error model and mapping helpers.
//! Every proxy route reports failures through `AppError`, which maps onto the
//! HTTP status and `{error: ...}` body the dashboard front end expects.

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt::{Display, Formatter};
use tracing::error;

/// Body returned to callers for any local failure; the detail only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    MissingParameter { message: String },
    InvalidParameter { message: String },
    Coordinator { status: u16, message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn message(&self) -> &str {
        match self {
            AppError::MissingParameter { message }
            | AppError::InvalidParameter { message }
            | AppError::Coordinator { message, .. }
            | AppError::NotFound { message }
            | AppError::Internal { message } => message.as_str(),
        }
    }

    /// Builds the 400 error naming every absent field, in the order given.
    pub fn missing<S: AsRef<str>>(fields: &[S]) -> Self {
        let names: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
        AppError::MissingParameter { message: format!("Missing required parameter(s): {}", names.join(", ")) }
    }
    pub fn coordinator<S: Into<String>>(status: u16, msg: S) -> Self { AppError::Coordinator { status, message: msg.into() } }
    pub fn not_found<S: Into<String>>(msg: S) -> Self { AppError::NotFound { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { AppError::Internal { message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::MissingParameter { .. } | AppError::InvalidParameter { .. } => 400,
            AppError::Coordinator { status, .. } => *status,
            AppError::NotFound { .. } => 404,
            AppError::Internal { .. } => 500,
        }
    }

    /// True when the coordinator rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Coordinator { status: 401, .. })
    }

    /// The text placed in the `error` field of the response body.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::Internal { .. } => INTERNAL_ERROR_MESSAGE,
            other => other.message(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::MissingParameter { message } => write!(f, "missing_parameter: {}", message),
            AppError::InvalidParameter { message } => write!(f, "invalid_parameter: {}", message),
            AppError::Coordinator { status, message } => write!(f, "coordinator_error ({}): {}", status, message),
            AppError::NotFound { message } => write!(f, "not_found: {}", message),
            AppError::Internal { message } => write!(f, "internal: {}", message),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Internal { message: format!("coordinator request failed: {}", err) }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal { message: format!("invalid json: {}", err) }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidParameter { message: format!("Invalid path parameter: {}", rejection.body_text()) }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message } = &self {
            error!(target: "proxy", "internal error: {}", message);
        }
        // Coordinator statuses outside the valid range collapse to 502.
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(serde_json::json!({ "error": self.public_message() }))).into_response()
    }
}
