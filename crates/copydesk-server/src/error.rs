//! Error types for the Copydesk server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use copydesk_core::errors::INTERNAL_ERROR_MESSAGE;
use copydesk_core::RelayError;
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the Copydesk server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Relay failure, rendered with the relay's own status and message
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Wrong, empty or missing password, or no password configured
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body over the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// A request body that could not be read or decoded.
    pub fn unreadable_body(status: StatusCode, details: impl Into<String>) -> Self {
        let details = details.into();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(details)
        } else {
            Self::Relay(RelayError::Parsing(details))
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Relay(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Config(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Relay(RelayError::MissingApiKey) => "config_error",
            ServerError::Relay(RelayError::NoImage) => "invalid_request",
            ServerError::Relay(RelayError::Upstream { .. }) => "upstream_error",
            ServerError::Relay(_) => "internal_error",
            ServerError::Unauthorized => "unauthorized",
            ServerError::PayloadTooLarge(_) => "payload_too_large",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }

    /// Text for the `error` field of the JSON body.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Relay(err) => err.client_message(),
            ServerError::Unauthorized => "Unauthorized".to_string(),
            ServerError::PayloadTooLarge(_) => "Payload too large".to_string(),
            ServerError::Config(_) | ServerError::Internal(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed ({}): {}", self.error_type(), self);
        } else {
            log::warn!("Request rejected ({}): {}", self.error_type(), self);
        }
        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
