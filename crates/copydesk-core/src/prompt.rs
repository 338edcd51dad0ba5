//! System prompt template.
//!
//! The prompt is text, not code: it is read from `prompts/system/main.md`
//! (or an explicit path) when the server starts. The shipped copy is also
//! compiled in so a bare binary still has a prompt to send.

use crate::core_types::{Role, UpstreamMessage};
use crate::errors::RelayError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../prompts/system/main.md");

/// Conventional location of the prompt, relative to the working directory.
pub const CONVENTIONAL_PROMPT_PATH: &str = "prompts/system/main.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: Arc<str>,
    source: PromptSource,
}

impl PromptTemplate {
    pub fn embedded() -> Self {
        Self {
            text: Arc::from(DEFAULT_SYSTEM_PROMPT),
            source: PromptSource::Embedded,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Result<Self, RelayError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RelayError::Config("System prompt is empty".to_string()));
        }
        Ok(Self {
            text: Arc::from(text),
            source: PromptSource::Embedded,
        })
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).await.map_err(|e| {
            RelayError::Config(format!(
                "Failed to read prompt template {}: {}",
                path.display(),
                e
            ))
        })?;
        if text.trim().is_empty() {
            return Err(RelayError::Config(format!(
                "Prompt template {} is empty",
                path.display()
            )));
        }
        Ok(Self {
            text: Arc::from(text),
            source: PromptSource::File(path.to_path_buf()),
        })
    }

    /// Pick the prompt to serve with.
    ///
    /// An explicit path must exist. Without one, the conventional path under
    /// `base_dir` is used when present, otherwise the compiled-in copy.
    pub async fn resolve(explicit: Option<&Path>, base_dir: &Path) -> Result<Self, RelayError> {
        if let Some(path) = explicit {
            log::info!("Loading system prompt from {}", path.display());
            return Self::from_file(path).await;
        }

        let conventional = base_dir.join(CONVENTIONAL_PROMPT_PATH);
        if fs::try_exists(&conventional).await.unwrap_or(false) {
            log::info!("Found system prompt: {}", conventional.display());
            return Self::from_file(conventional).await;
        }

        log::info!("No prompt template found, using the built-in system prompt");
        Ok(Self::embedded())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &PromptSource {
        &self.source
    }

    pub fn system_message(&self) -> UpstreamMessage {
        UpstreamMessage::text(Role::System, self.text.as_ref())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::embedded()
    }
}
