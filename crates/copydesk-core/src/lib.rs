//! Core of the Copydesk copywriting assistant.
//!
//! Copydesk relays a browser conversation to an OpenAI-compatible chat
//! completion API with a fixed brand-style system prompt in front of it.
//! This crate holds everything that is not HTTP plumbing:
//!
//! - **Message model**: roles, caller messages and upstream message shapes
//! - **Prompt template**: the system prompt, loaded from a template file
//! - **Upstream client**: the completion backend trait and its OpenAI implementation
//! - **Relay**: composition of text-only and image requests
//! - **Auth gate**: the shared-password comparison
//! - **Configuration**: secrets and limits resolved from the environment

pub mod auth;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod prompt;
pub mod relay;

pub use auth::{verify_password, AuthRequest, AUTH_FLAG_KEY};
pub use config::{CompletionLimits, RelayConfig};
pub use core_types::{
    CallerMessage, ContentPart, ImageUpload, Message, MessageContent, Role, UpstreamMessage, UpstreamTurn,
};
pub use errors::RelayError;
pub use llm::{CompletionBackend, CompletionRequest};
pub use prompt::PromptTemplate;
pub use relay::Relay;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
