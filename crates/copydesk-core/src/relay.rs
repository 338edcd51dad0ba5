//! Request composition and forwarding.
//!
//! A relay invocation makes at most one upstream call and keeps no state
//! between calls. The prompt and backend are shared read-only.

use crate::config::{CompletionLimits, RelayConfig};
use crate::core_types::{
    CallerMessage, ContentPart, ImageUpload, ImageUrl, Message, Role, UpstreamMessage, UpstreamTurn,
};
use crate::errors::RelayError;
use crate::llm::providers::create_backend;
use crate::llm::{CompletionBackend, CompletionRequest};
use crate::prompt::PromptTemplate;
use std::sync::Arc;

/// Instruction sent alongside every uploaded image.
pub const IMAGE_INSTRUCTION: &str = "Analyze the copy in this image. Extract all visible text and provide suggestions for improvement based on the product copy guidelines.";

#[derive(Clone)]
pub struct Relay {
    backend: Option<Arc<dyn CompletionBackend>>,
    prompt: PromptTemplate,
    text_limits: CompletionLimits,
    image_limits: CompletionLimits,
}

impl Relay {
    pub fn new(prompt: PromptTemplate, backend: Option<Arc<dyn CompletionBackend>>) -> Self {
        Self {
            backend,
            prompt,
            text_limits: CompletionLimits::TEXT,
            image_limits: CompletionLimits::IMAGE,
        }
    }

    /// Relay talking to the OpenAI-compatible API described by `config`.
    pub fn from_config(config: &RelayConfig, prompt: PromptTemplate) -> Self {
        Self::new(prompt, create_backend(config))
            .with_text_limits(config.text_limits)
            .with_image_limits(config.image_limits)
    }

    pub fn with_text_limits(mut self, limits: CompletionLimits) -> Self {
        self.text_limits = limits;
        self
    }

    pub fn with_image_limits(mut self, limits: CompletionLimits) -> Self {
        self.image_limits = limits;
        self
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Fail fast when no upstream credential is configured.
    pub fn ensure_configured(&self) -> Result<&Arc<dyn CompletionBackend>, RelayError> {
        self.backend.as_ref().ok_or(RelayError::MissingApiKey)
    }

    /// System prompt followed by the caller's messages, untouched.
    pub fn compose_text(&self, messages: Vec<CallerMessage>) -> CompletionRequest {
        let mut upstream = Vec::with_capacity(messages.len() + 1);
        upstream.push(UpstreamTurn::from(self.prompt.system_message()));
        upstream.extend(messages.into_iter().map(UpstreamTurn::from));
        CompletionRequest::new(upstream, self.text_limits)
    }

    /// System prompt, prior history without `image` entries, then one user
    /// turn carrying the instruction and the embedded picture.
    pub fn compose_image(&self, image: &ImageUpload, history: Vec<Message>) -> CompletionRequest {
        let mut upstream: Vec<UpstreamMessage> = Vec::with_capacity(history.len() + 2);
        upstream.push(self.prompt.system_message());
        upstream.extend(
            history
                .into_iter()
                .filter(|message| message.role != Role::Image)
                .map(UpstreamMessage::from),
        );
        upstream.push(UpstreamMessage::parts(
            Role::User,
            vec![
                ContentPart::Text {
                    text: IMAGE_INSTRUCTION.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_uri(),
                    },
                },
            ],
        ));
        CompletionRequest::new(upstream, self.image_limits)
    }

    pub async fn relay_text(&self, messages: Vec<CallerMessage>) -> Result<Message, RelayError> {
        let backend = self.ensure_configured()?;
        log::info!("Relaying text chat with {} messages", messages.len());
        backend.complete(self.compose_text(messages)).await
    }

    pub async fn relay_image(
        &self,
        image: &ImageUpload,
        history: Vec<Message>,
    ) -> Result<Message, RelayError> {
        let backend = self.ensure_configured()?;
        log::info!(
            "Relaying image analysis ({}, {} bytes) with {} prior messages",
            image.mime_type,
            image.bytes.len(),
            history.len()
        );
        backend.complete(self.compose_image(image, history)).await
    }
}
