//! Error types for the relay and its upstream client
//!
//! Every failure the relay can hit maps onto one of a handful of outcomes the
//! HTTP layer knows how to render: a configuration failure, a malformed
//! request, an upstream failure carrying the upstream status and body, or a
//! generic internal error for transport and parsing problems.

use thiserror::Error;

/// Message shown to callers for failures whose details stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Missing OpenAI API key")]
    MissingApiKey,
    #[error("No image uploaded")]
    NoImage,
    #[error("Upstream completion API returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// HTTP status the relay answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::NoImage => 400,
            RelayError::Upstream { status, .. } => *status,
            RelayError::MissingApiKey
            | RelayError::Transport(_)
            | RelayError::Parsing(_)
            | RelayError::Config(_) => 500,
        }
    }

    /// Text placed in the `error` field of the relay's JSON response.
    ///
    /// Upstream failures pass the upstream body through untouched; transport
    /// and parsing failures collapse into a generic message.
    pub fn client_message(&self) -> String {
        match self {
            RelayError::MissingApiKey | RelayError::NoImage => self.to_string(),
            RelayError::Upstream { body, .. } => body.clone(),
            RelayError::Transport(_)
            | RelayError::Parsing(_)
            | RelayError::Config(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, RelayError::Upstream { .. })
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Parsing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::MissingApiKey.status_code(), 500);
        assert_eq!(RelayError::NoImage.status_code(), 400);
        assert_eq!(
            RelayError::Upstream {
                status: 429,
                body: "slow down".to_string()
            }
            .status_code(),
            429
        );
        assert_eq!(RelayError::Parsing("bad".to_string()).status_code(), 500);
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            RelayError::MissingApiKey.client_message(),
            "Missing OpenAI API key"
        );
        assert_eq!(RelayError::NoImage.client_message(), "No image uploaded");
        let upstream = RelayError::Upstream {
            status: 429,
            body: r#"{"error":{"message":"Rate limit reached"}}"#.to_string(),
        };
        assert_eq!(
            upstream.client_message(),
            r#"{"error":{"message":"Rate limit reached"}}"#
        );
        assert_eq!(
            RelayError::Transport("connection reset".to_string()).client_message(),
            INTERNAL_ERROR_MESSAGE
        );
    }
}
