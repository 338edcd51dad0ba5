//! Client SDK for the Copydesk relay
//!
//! Drives a copywriting conversation either against a running
//! `copydesk-server` over HTTP or against an in-process `Relay`. On top of the
//! transport sit the password gate (`AuthGate`) and the chat session state
//! machine (`ChatSession`), which mirror what the browser page does.

use async_trait::async_trait;
use copydesk_core::{ImageUpload, Message, Relay};
use std::sync::Arc;

pub mod auth;
pub mod direct_client;
pub mod error;
pub mod http_client;
pub mod session;

pub use auth::{AuthGate, FileFlagStore, FlagStore, MemoryFlagStore};
pub use direct_client::DirectRelayClient;
pub use error::{ClientError, Result};
pub use http_client::HttpRelayClient;
pub use session::{ChatEntry, ChatSession, SessionState, SubmitOutcome, ViewElement};

/// Transport to the relay's two endpoints.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Check a password against the gate. `Ok(false)` means rejected.
    async fn authenticate(&self, password: &str) -> Result<bool>;

    /// Send a text conversation and receive the single reply.
    async fn chat(&self, messages: Vec<Message>) -> Result<Message>;

    /// Send an image with the conversation that preceded it.
    async fn analyze_image(&self, image: ImageUpload, history: Vec<Message>) -> Result<Message>;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn authenticate(&self, password: &str) -> Result<bool> {
        (**self).authenticate(password).await
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<Message> {
        (**self).chat(messages).await
    }

    async fn analyze_image(&self, image: ImageUpload, history: Vec<Message>) -> Result<Message> {
        (**self).analyze_image(image, history).await
    }
}

/// Factory for creating RelayClient instances
pub struct RelayClientFactory;

impl RelayClientFactory {
    /// Create an HTTP client for a remote server
    pub fn create_http_client(base_url: impl Into<String>) -> Box<dyn RelayClient> {
        Box::new(HttpRelayClient::new(base_url))
    }

    /// Create a direct client for an embedded relay
    pub fn create_direct_client(relay: Arc<Relay>, chat_password: Option<String>) -> Box<dyn RelayClient> {
        Box::new(DirectRelayClient::new(relay, chat_password))
    }
}
