use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuerError {
    /// Signing key missing, unparsable or on the wrong curve, or another
    /// configuration value is invalid. Fatal; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Subject missing or empty, or the request body is not usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Signing or key export failed unexpectedly.
    #[error("Internal server error")]
    Internal,
}

impl From<ConfigError> for IssuerError {
    fn from(err: ConfigError) -> Self {
        IssuerError::Configuration(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            IssuerError::Configuration(reason) => {
                tracing::error!(target: "issuer.errors", reason = %reason, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "The issuer is not configured correctly".to_string(),
                )
            }
            IssuerError::InvalidInput(reason) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                reason.clone(),
            ),
            IssuerError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed".to_string(),
            ),
            IssuerError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal Server Error".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
