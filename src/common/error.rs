// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;
use crate::services::ai::AIError;
use crate::services::settings::SettingsError;
use crate::services::storage::StorageError;

/// API error types
///
/// Every failure of a client action ends up here and is rendered as
/// `{ "error": ..., "code": ... }`. Moderation rejection is the only variant a
/// client is expected to treat differently from "show message, abort".
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    InternalServer(String),
    ServiceUnavailable(String),
    BadGateway(String),
    DatabaseError(sqlx::Error),
    ValidationError(String),
    ModerationRejected(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad Gateway: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::ModerationRejected(reason) => write!(f, "Image rejected: {}", reason),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InternalServer(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
            }
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::ModerationRejected(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MODERATION_REJECTED")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();

        let error_message = match self {
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                "Database operation failed".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServer(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ValidationError(msg)
            | ApiError::ModerationRejected(msg) => msg,
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::DatabaseError(db) => ApiError::DatabaseError(db),
            SettingsError::InvalidConfig(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServer(other.to_string()),
        }
    }
}

impl From<AIError> for ApiError {
    fn from(e: AIError) -> Self {
        match e {
            AIError::NotConfigured(provider) => ApiError::ServiceUnavailable(format!(
                "AI provider '{}' is not configured",
                provider
            )),
            AIError::Settings(inner) => ApiError::from(inner),
            AIError::RequestFailed(msg) => ApiError::BadGateway(msg),
            AIError::InvalidResponse(msg) => {
                ApiError::BadGateway(format!("Unreadable AI response: {}", msg))
            }
            AIError::InvalidInput(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidDataUrl | StorageError::UnsupportedType(_) => {
                ApiError::BadRequest(e.to_string())
            }
            StorageError::TooLarge(_) => ApiError::BadRequest(e.to_string()),
            StorageError::NotFound => ApiError::NotFound("File not found".to_string()),
            StorageError::Settings(inner) => ApiError::from(inner),
            other => {
                error!(error = %other, "Storage operation failed");
                ApiError::InternalServer("Failed to store file".to_string())
            }
        }
    }
}
