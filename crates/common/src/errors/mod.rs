//! Error types for AnswerForge services
//!
//! Provides:
//! - Distinct error types for each failure mode of the answer pipeline
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidInput,

    // Rate limiting (6xxx)
    RateLimited,

    // Startup errors (7xxx)
    LoadError,

    // External service errors (8xxx)
    UpstreamError,
    GeneratorUnavailable,
    GeneratorTimeout,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 1001,

            ErrorCode::RateLimited => 6001,

            ErrorCode::LoadError => 7001,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::GeneratorUnavailable => 8002,
            ErrorCode::GeneratorTimeout => 8003,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Startup errors
    #[error("Failed to load FAQ source {}: {message}", .path.display())]
    LoadError { path: PathBuf, message: String },

    // Generator errors (recovered inside the resolver)
    #[error("Generator unavailable: {message}")]
    GeneratorUnavailable { message: String },

    #[error("Generator timeout after {timeout_ms}ms")]
    GeneratorTimeout { timeout_ms: u64 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput { message: message.into() }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidInput { .. } => ErrorCode::InvalidInput,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::LoadError { .. } => ErrorCode::LoadError,
            AppError::GeneratorUnavailable { .. } => ErrorCode::GeneratorUnavailable,
            AppError::GeneratorTimeout { .. } => ErrorCode::GeneratorTimeout,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::LoadError { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::GeneratorUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,

            // 504 Gateway Timeout
            AppError::GeneratorTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error detail
    pub error: String,
    pub code: ErrorCode,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
            status: "error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                error_code = code.as_code(),
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                error_code = code.as_code(),
                status = status.as_u16(),
                "Client error"
            );
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string()
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::invalid_input("question is empty");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_startup_errors_are_server_errors() {
        let err = AppError::LoadError {
            path: PathBuf::from("data/faqs.csv"),
            message: "missing column `answer`".into(),
        };
        assert_eq!(err.code(), ErrorCode::LoadError);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("data/faqs.csv"));

        let err = AppError::Configuration { message: "no key".into() };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_numeric_codes_group_by_family() {
        assert_eq!(ErrorCode::InvalidInput.as_code() / 1000, 1);
        assert_eq!(ErrorCode::GeneratorTimeout.as_code() / 1000, 8);
        assert_eq!(ErrorCode::ConfigurationError.as_code() / 1000, 9);
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::new(ErrorCode::InvalidInput, "Question is required");
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body["error"], "Question is required");
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["status"], "error");
    }
}
