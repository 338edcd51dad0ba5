//! Relay configuration resolved from the process environment.
//!
//! Secrets (`CHAT_PASSWORD`, `OPENAI_API_KEY`) are only ever read from the
//! environment. Operational settings have defaults and `with_*` overrides
//! so the server binary can layer its command line on top.

use std::env;
use std::fmt;
use std::time::Duration;

pub const CHAT_PASSWORD_ENV: &str = "CHAT_PASSWORD";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_API_BASE_ENV: &str = "OPENAI_API_BASE";
pub const MODEL_ENV: &str = "COPYDESK_MODEL";

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano-2025-04-14";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Reply-length cap and sampling temperature for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionLimits {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CompletionLimits {
    /// Text-only chat: longer-form variety in phrasing.
    pub const TEXT: CompletionLimits = CompletionLimits {
        max_tokens: 600,
        temperature: Some(0.7),
    };

    /// Image analysis: the upstream default temperature, a larger reply budget.
    pub const IMAGE: CompletionLimits = CompletionLimits {
        max_tokens: 800,
        temperature: None,
    };
}

#[derive(Clone)]
pub struct RelayConfig {
    pub chat_password: Option<String>,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub upstream_timeout: Duration,
    pub text_limits: CompletionLimits,
    pub image_limits: CompletionLimits,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chat_password: None,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            text_limits: CompletionLimits::TEXT,
            image_limits: CompletionLimits::IMAGE,
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the environment. Empty values count as unset.
    pub fn from_env() -> Self {
        let mut config = Self {
            chat_password: non_empty_env(CHAT_PASSWORD_ENV),
            api_key: non_empty_env(OPENAI_API_KEY_ENV),
            ..Self::default()
        };
        if let Some(api_base) = non_empty_env(OPENAI_API_BASE_ENV) {
            config = config.with_api_base(api_base);
        }
        if let Some(model) = non_empty_env(MODEL_ENV) {
            config.model = model;
        }

        if config.api_key.is_none() {
            log::warn!(
                "{} is not set; chat requests will fail until it is configured",
                OPENAI_API_KEY_ENV
            );
        }
        if config.chat_password.is_none() {
            log::warn!(
                "{} is not set; every unlock attempt will be rejected",
                CHAT_PASSWORD_ENV
            );
        }
        config
    }

    pub fn with_chat_password(mut self, password: impl Into<String>) -> Self {
        self.chat_password = Some(password.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_text_limits(mut self, limits: CompletionLimits) -> Self {
        self.text_limits = limits;
        self
    }

    pub fn with_image_limits(mut self, limits: CompletionLimits) -> Self {
        self.image_limits = limits;
        self
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("chat_password", &self.chat_password.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("text_limits", &self.text_limits)
            .field("image_limits", &self.image_limits)
            .finish()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            CHAT_PASSWORD_ENV,
            OPENAI_API_KEY_ENV,
            OPENAI_API_BASE_ENV,
            MODEL_ENV,
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_reads_secrets() {
        clear_env();
        env::set_var(CHAT_PASSWORD_ENV, "letmein");
        env::set_var(OPENAI_API_KEY_ENV, "sk-test");
        env::set_var(OPENAI_API_BASE_ENV, "http://localhost:9999/v1/");

        let config = RelayConfig::from_env();
        assert_eq!(config.chat_password.as_deref(), Some("letmein"));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_base, "http://localhost:9999/v1");
        assert_eq!(config.model, DEFAULT_MODEL);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_empty_env_values_are_unset() {
        clear_env();
        env::set_var(CHAT_PASSWORD_ENV, "");
        env::set_var(OPENAI_API_KEY_ENV, "");

        let config = RelayConfig::from_env();
        assert!(config.chat_password.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        clear_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RelayConfig::new()
            .with_api_key("sk-very-secret")
            .with_chat_password("hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_default_limits() {
        let config = RelayConfig::default();
        assert_eq!(config.text_limits.max_tokens, 600);
        assert_eq!(config.text_limits.temperature, Some(0.7));
        assert_eq!(config.image_limits.max_tokens, 800);
        assert_eq!(config.image_limits.temperature, None);
    }
}
