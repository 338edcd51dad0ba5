//! Completion provider implementations.

use crate::config::RelayConfig;
use crate::llm::CompletionBackend;
use std::sync::Arc;

pub mod openai;

/// Build the upstream backend for a configuration.
///
/// Returns `None` when no API key is configured; the relay then answers
/// every chat request with a configuration error instead of calling out.
pub fn create_backend(config: &RelayConfig) -> Option<Arc<dyn CompletionBackend>> {
    let api_key = config.api_key.clone()?;
    let client = openai::OpenAIClient::new(api_key, config.model.clone())
        .with_api_base(config.api_base.clone())
        .with_timeout(config.upstream_timeout);
    Some(Arc::new(client))
}
