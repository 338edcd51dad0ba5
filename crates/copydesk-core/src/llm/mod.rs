//! Upstream chat-completion abstraction.
//!
//! The relay talks to its model through `CompletionBackend`, so the OpenAI
//! client can be swapped for a recording fake in tests or another
//! OpenAI-compatible endpoint in deployment.

use crate::config::CompletionLimits;
use crate::core_types::{Message, UpstreamTurn};
use crate::errors::RelayError;
use async_trait::async_trait;

pub mod providers;

pub use providers::openai::OpenAIClient;

/// One fully composed upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<UpstreamTurn>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new<M: Into<UpstreamTurn>>(messages: Vec<M>, limits: CompletionLimits) -> Self {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            max_tokens: limits.max_tokens,
            temperature: limits.temperature,
        }
    }

    pub fn image_count(&self) -> usize {
        self.messages.iter().map(UpstreamTurn::image_count).sum()
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send one request upstream and return the single reply message.
    async fn complete(&self, request: CompletionRequest) -> Result<Message, RelayError>;
}
