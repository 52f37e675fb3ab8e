//! Domain error types for the webmail launcher.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::config::ConfigError;
use crate::crypto::CryptoError;
use crate::middleware::rate_limit::RateLimitDecision;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Missing or invalid key material / configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored credential could not be decrypted
    #[error("Stored credential could not be decrypted")]
    Decryption,

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Authentication failed
    #[error("{0}")]
    Unauthorized(String),

    /// Request rejected before authentication (CSRF)
    #[error("{0}")]
    Forbidden(String),

    /// Too many requests for this client and endpoint
    #[error("Too many requests")]
    RateLimited(RateLimitDecision),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The uniform authentication failure used by login.
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized("Invalid credentials".to_string())
    }

    /// The uniform failure for missing, expired or revoked sessions.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Configuration(_)
            | AppError::Decryption
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                ("DATABASE_ERROR", "An internal database error occurred".to_string())
            }
            AppError::Configuration(err_str) => {
                tracing::error!("Configuration error: {}", err_str);
                ("CONFIGURATION_ERROR", "Server is misconfigured".to_string())
            }
            AppError::Decryption => ("DECRYPTION_ERROR", self.to_string()),
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Conflict(_) => ("CONFLICT", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Forbidden(_) => ("FORBIDDEN", self.to_string()),
            AppError::RateLimited(_) => ("RATE_LIMITED", self.to_string()),
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let AppError::RateLimited(decision) = self {
            for header in decision.headers() {
                builder.insert_header(header);
            }
        }

        builder.json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption => AppError::Decryption,
            CryptoError::Configuration(e) => AppError::Configuration(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
