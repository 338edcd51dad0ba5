use crate::config::{DEFAULT_API_BASE, DEFAULT_UPSTREAM_TIMEOUT};
use crate::core_types::{Message, Role};
use crate::errors::RelayError;
use crate::llm::{CompletionBackend, CompletionRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    timeout: Duration,
}

impl OpenAIClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model,
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = temperature.into();
        }

        body
    }

    fn parse_response(&self, response_text: &str) -> Result<Message, RelayError> {
        let response: ChatCompletionResponse = serde_json::from_str(response_text)
            .map_err(|e| RelayError::Parsing(format!("Invalid JSON response: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::Parsing("Empty choices array".to_string()))?;

        Ok(Message {
            role: choice.message.role,
            content: choice.message.content.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionBackend for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Message, RelayError> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.build_request_body(&request);

        log::debug!(
            "OpenAI API request to {}: {} messages, {} image(s), max_tokens={}, temperature={:?}",
            url,
            request.messages.len(),
            request.image_count(),
            request.max_tokens,
            request.temperature
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            log::warn!("OpenAI API returned {}: {}", status, response_text);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: response_text,
            });
        }

        log::debug!("OpenAI API response ({}): {} bytes", status, response_text.len());
        self.parse_response(&response_text)
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default = "assistant_role")]
    role: Role,
    content: Option<String>,
}

fn assistant_role() -> Role {
    Role::Assistant
}
