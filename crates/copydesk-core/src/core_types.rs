//! Message types shared by the relay, the server and the chat client
//!
//! Two shapes live here. `Message` is what browsers and clients exchange with
//! the relay: a role and a plain-text content. `UpstreamMessage` is what the
//! relay sends to the completion API, where content may be a list of typed
//! parts so that an image can ride along with its instruction text.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Client-side rendering role for uploaded pictures. Never sent upstream.
    Image,
    /// Any other role string, passed through untouched.
    #[serde(untagged)]
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Image => "image",
            Role::Other(role) => role,
        }
    }

    /// Roles a client may forward to the relay as conversation history.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Role::System | Role::User | Role::Assistant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl UpstreamMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Number of embedded image references in this message.
    pub fn image_count(&self) -> usize {
        match &self.content {
            MessageContent::Text(_) => 0,
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| matches!(part, ContentPart::ImageUrl { .. }))
                .count(),
        }
    }
}

impl From<Message> for UpstreamMessage {
    fn from(message: Message) -> Self {
        UpstreamMessage::text(message.role, message.content)
    }
}

/// A caller-supplied conversation entry, kept exactly as it was parsed.
///
/// The text path forwards these upstream without looking inside, so extra
/// fields, `null` content and structured content all survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerMessage(pub Value);

impl CallerMessage {
    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }
}

impl From<Message> for CallerMessage {
    fn from(message: Message) -> Self {
        CallerMessage(serde_json::json!({
            "role": message.role.as_str(),
            "content": message.content,
        }))
    }
}

/// One entry of the message list sent to the completion API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamTurn {
    /// Built by the relay: the system prompt or an image turn.
    Composed(UpstreamMessage),
    /// Forwarded from the caller untouched.
    Verbatim(CallerMessage),
}

impl UpstreamTurn {
    pub fn role(&self) -> Option<&str> {
        match self {
            UpstreamTurn::Composed(message) => Some(message.role.as_str()),
            UpstreamTurn::Verbatim(message) => message.role(),
        }
    }

    pub fn as_composed(&self) -> Option<&UpstreamMessage> {
        match self {
            UpstreamTurn::Composed(message) => Some(message),
            UpstreamTurn::Verbatim(_) => None,
        }
    }

    pub fn image_count(&self) -> usize {
        match self {
            UpstreamTurn::Composed(message) => message.image_count(),
            UpstreamTurn::Verbatim(message) => message
                .0
                .get("content")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|part| part.get("type").and_then(Value::as_str) == Some("image_url"))
                        .count()
                })
                .unwrap_or(0),
        }
    }
}

impl From<UpstreamMessage> for UpstreamTurn {
    fn from(message: UpstreamMessage) -> Self {
        UpstreamTurn::Composed(message)
    }
}

impl From<Message> for UpstreamTurn {
    fn from(message: Message) -> Self {
        UpstreamTurn::Composed(message.into())
    }
}

impl From<CallerMessage> for UpstreamTurn {
    fn from(message: CallerMessage) -> Self {
        UpstreamTurn::Verbatim(message)
    }
}

/// An uploaded picture as received from a browser or client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub mime_type: String,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub const FALLBACK_MIME_TYPE: &'static str = "application/octet-stream";

    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            file_name: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }

    /// Self-contained `data:` URI carrying the mime type and base64 payload.
    pub fn data_uri(&self) -> String {
        let mime_type = if self.mime_type.is_empty() {
            Self::FALLBACK_MIME_TYPE
        } else {
            self.mime_type.as_str()
        };
        format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(&self.bytes))
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}
