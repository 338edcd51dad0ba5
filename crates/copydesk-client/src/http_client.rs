use async_trait::async_trait;
use copydesk_core::{AuthRequest, ImageUpload, Message};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::RelayClient;

/// HTTP client for a remote Copydesk server
pub struct HttpRelayClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(90),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a relay reply into its message, or the relay's `{error}` text.
async fn read_reply(response: Response) -> Result<Message> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<Message>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    log::warn!("Relay answered {}: {}", status, message);
    Err(ClientError::Relay {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn authenticate(&self, password: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.url("/api/auth"))
            .timeout(self.timeout)
            .json(&AuthRequest {
                password: Some(password.to_string()),
            })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            status => Err(ClientError::Relay {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<Message> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await?;

        read_reply(response).await
    }

    async fn analyze_image(&self, image: ImageUpload, history: Vec<Message>) -> Result<Message> {
        let mut part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.unwrap_or_else(|| "upload".to_string()));
        if !image.mime_type.is_empty() {
            part = part.mime_str(&image.mime_type)?;
        }
        let form = Form::new()
            .part("image", part)
            .text("messages", serde_json::to_string(&history)?);

        let response = self
            .client
            .post(self.url("/api/chat"))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;

        read_reply(response).await
    }
}
