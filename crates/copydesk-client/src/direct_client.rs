use async_trait::async_trait;
use copydesk_core::{verify_password, ImageUpload, Message, Relay};
use std::sync::Arc;

use crate::error::Result;
use crate::RelayClient;

/// Client for a relay embedded in the same process.
pub struct DirectRelayClient {
    relay: Arc<Relay>,
    chat_password: Option<String>,
}

impl DirectRelayClient {
    pub fn new(relay: Arc<Relay>, chat_password: Option<String>) -> Self {
        Self { relay, chat_password }
    }
}

#[async_trait]
impl RelayClient for DirectRelayClient {
    async fn authenticate(&self, password: &str) -> Result<bool> {
        Ok(verify_password(Some(password), self.chat_password.as_deref()))
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<Message> {
        let messages = messages.into_iter().map(Into::into).collect();
        Ok(self.relay.relay_text(messages).await?)
    }

    async fn analyze_image(&self, image: ImageUpload, history: Vec<Message>) -> Result<Message> {
        Ok(self.relay.relay_image(&image, history).await?)
    }
}
