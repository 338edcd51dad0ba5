use copydesk_core::RelayError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The relay answered with a non-success status.
    #[error("Relay returned {status}: {message}")]
    Relay { status: u16, message: String },

    #[error("Incorrect password.")]
    IncorrectPassword,

    /// A request is already in flight for this session.
    #[error("A request is already in progress")]
    SessionBusy,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode relay response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status reported by the relay, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Relay { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<RelayError> for ClientError {
    fn from(err: RelayError) -> Self {
        ClientError::Relay {
            status: err.status_code(),
            message: err.client_message(),
        }
    }
}
