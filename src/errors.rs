use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use tower_governor::GovernorError;

use crate::db::StorageError;
use crate::models::ErrorResponse;
use crate::validation::ValidationError;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Input failed validation; carries the offending fields.
    Validation(ValidationError),
    /// Document store failure.
    Storage(StorageError),
    /// Request refused before reaching the handler logic (unreadable or oversized body).
    Rejected { status: StatusCode, message: String },
    /// Client exceeded its request quota; retry after `wait_secs`.
    RateLimited { wait_secs: u64 },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Rejected { status, message } => {
                write!(f, "Rejected ({}): {}", status, message)
            }
            AppError::RateLimited { wait_secs } => {
                write!(f, "Rate limited, retry in {}s", wait_secs)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected { status, .. } => *status,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Storage failures are logged in full but reported with a generic
    /// message, so connection details never reach the caller.
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            AppError::RateLimited { wait_secs } => Some(wait_secs.to_string()),
            _ => None,
        };
        let body = match self {
            AppError::Validation(e) => {
                tracing::warn!("Rejected input: {:?}", e.fields());
                ErrorResponse {
                    detail: "Validation failed".to_string(),
                    errors: Some(e.errors.iter().map(|f| f.to_body()).collect()),
                }
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                let detail = match e {
                    StorageError::Unavailable(_) => "Database unavailable",
                    StorageError::Write(_) => "Failed to store document",
                    StorageError::Read(_) => "Failed to read documents",
                };
                ErrorResponse {
                    detail: detail.to_string(),
                    errors: None,
                }
            }
            AppError::Rejected { message, .. } => ErrorResponse {
                detail: message,
                errors: None,
            },
            AppError::RateLimited { wait_secs } => {
                tracing::warn!("Rate limit hit, retry in {}s", wait_secs);
                ErrorResponse {
                    detail: format!("Too many requests, retry in {}s", wait_secs),
                    errors: None,
                }
            }
        };

        match retry_after {
            Some(secs) => (status, [(header::RETRY_AFTER, secs)], Json(body)).into_response(),
            None => (status, Json(body)).into_response(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<JsonRejection> for AppError {
    /// Keeps the rejection's own status (400, 413, 415, 422).
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<GovernorError> for AppError {
    /// Converts a rate limiter refusal into an `AppError`.
    fn from(err: GovernorError) -> Self {
        match err {
            GovernorError::TooManyRequests { wait_time, .. } => AppError::RateLimited {
                wait_secs: wait_time,
            },
            GovernorError::UnableToExtractKey => {
                tracing::error!("Rate limiter could not determine the client address");
                AppError::Rejected {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error".to_string(),
                }
            }
            GovernorError::Other { code, msg, .. } => AppError::Rejected {
                status: code,
                message: msg.unwrap_or_else(|| {
                    code.canonical_reason().unwrap_or("Request rejected").to_string()
                }),
            },
        }
    }
}
