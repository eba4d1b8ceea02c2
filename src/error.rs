//! Error types for TripGenie
//!
//! All errors implement `IntoResponse` for Axum handlers and render the
//! `{ "success": false, "error": "..." }` envelope the client expects.

use crate::pipeline::PipelineError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// Provider credentials are read once at startup; this is fatal.
    #[error(
        "Missing credentials for provider '{provider}': environment variable {env_var} is not set"
    )]
    MissingCredentials { provider: String, env_var: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::MissingCredentials { .. }
            | Self::Pipeline(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API clients
    ///
    /// Pipeline failures get a retry hint instead of upstream detail; the
    /// detail is logged where the failure is classified.
    pub fn client_message(&self) -> String {
        match self {
            Self::Pipeline(e) => e.client_message(),
            Self::Validation(msg) | Self::RateLimited(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
