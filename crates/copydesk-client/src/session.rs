//! Chat session state machine.
//!
//! A session owns the visible transcript and allows one request in flight:
//! `Idle -> Sending -> Idle`. The transcript only grows, except for the
//! "Analyzing image..." placeholder, which is replaced by the reply or removed
//! when the image request fails.

use copydesk_core::{ImageUpload, Message, Role};
use std::iter;
use std::sync::{Mutex, MutexGuard};

use crate::error::{ClientError, Result};
use crate::RelayClient;

pub const WELCOME_MESSAGE: &str = "Hello! I'm your Safeguard Global Copy Assistant. I'm here to help you write clear, consistent, and user-friendly UI copy.

I can help you with:
• Writing clear error messages
• Creating effective button labels
• Crafting helpful tooltips
• Improving form field labels
• Writing empty state messages
• And much more!

What would you like help with today?";

pub const TEXT_FAILURE: &str = "Sorry, something went wrong. Please try again.";
pub const IMAGE_FAILURE: &str = "Sorry, something went wrong analyzing the image.";
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing image...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// One transcript entry. Image entries carry the upload and an empty content.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub image: Option<ImageUpload>,
}

impl ChatEntry {
    fn from_message(message: Message) -> Self {
        Self {
            role: message.role,
            content: message.content,
            image: None,
        }
    }

    fn image(upload: ImageUpload) -> Self {
        Self {
            role: Role::Image,
            content: String::new(),
            image: Some(upload),
        }
    }

    fn to_message(&self) -> Message {
        Message::new(self.role.clone(), self.content.clone())
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Nothing was sent: blank text or a non-image upload.
    Ignored,
    Replied(Message),
    /// The request failed and the error banner was raised.
    Failed(ClientError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewElement {
    Bubble(ChatEntry),
    TypingIndicator,
    ScrollAnchor,
}

#[derive(Debug)]
struct SessionInner {
    entries: Vec<ChatEntry>,
    state: SessionState,
    error: Option<String>,
    draft: String,
}

impl SessionInner {
    fn history(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|entry| entry.role.is_conversational())
            .map(ChatEntry::to_message)
            .collect()
    }

    fn begin(&mut self) -> Result<()> {
        if self.state == SessionState::Sending {
            return Err(ClientError::SessionBusy);
        }
        self.error = None;
        Ok(())
    }
}

pub struct ChatSession<C: RelayClient> {
    client: C,
    inner: Mutex<SessionInner>,
}

impl<C: RelayClient> ChatSession<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            inner: Mutex::new(SessionInner {
                entries: vec![ChatEntry::from_message(Message::assistant(WELCOME_MESSAGE))],
                state: SessionState::Idle,
                error: None,
                draft: String::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.lock().entries.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_sending(&self) -> bool {
        self.state() == SessionState::Sending
    }

    /// Text of the error banner, if one is raised.
    pub fn error_banner(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Conversation that would be sent with the next request.
    pub fn history(&self) -> Vec<Message> {
        self.lock().history()
    }

    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock().draft = text.into();
    }

    /// Submit the current draft, clearing it once it is sent.
    pub async fn submit_draft(&self) -> Result<SubmitOutcome> {
        let text = self.draft();
        self.submit_text(&text).await
    }

    pub async fn submit_text(&self, text: &str) -> Result<SubmitOutcome> {
        let history = {
            let mut inner = self.lock();
            inner.begin()?;
            let text = text.trim();
            if text.is_empty() {
                return Ok(SubmitOutcome::Ignored);
            }
            inner.entries.push(ChatEntry::from_message(Message::user(text)));
            inner.draft.clear();
            inner.state = SessionState::Sending;
            inner.history()
        };

        let result = self.client.chat(history).await;

        let mut inner = self.lock();
        inner.state = SessionState::Idle;
        match result {
            Ok(reply) => {
                inner.entries.push(ChatEntry::from_message(reply.clone()));
                Ok(SubmitOutcome::Replied(reply))
            }
            Err(e) => {
                log::warn!("Chat request failed: {}", e);
                inner.error = Some(TEXT_FAILURE.to_string());
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    pub async fn submit_image(&self, upload: ImageUpload) -> Result<SubmitOutcome> {
        let (history, placeholder) = {
            let mut inner = self.lock();
            inner.begin()?;
            if !upload.is_image() {
                log::debug!("Ignoring non-image upload of type {:?}", upload.mime_type);
                return Ok(SubmitOutcome::Ignored);
            }
            let history = inner.history();
            inner.entries.push(ChatEntry::image(upload.clone()));
            inner
                .entries
                .push(ChatEntry::from_message(Message::assistant(ANALYZING_PLACEHOLDER)));
            inner.state = SessionState::Sending;
            (history, inner.entries.len() - 1)
        };

        let result = self.client.analyze_image(upload, history).await;

        let mut inner = self.lock();
        inner.state = SessionState::Idle;
        match result {
            Ok(reply) => {
                inner.entries[placeholder] = ChatEntry::from_message(reply.clone());
                Ok(SubmitOutcome::Replied(reply))
            }
            Err(e) => {
                log::warn!("Image analysis failed: {}", e);
                inner.entries.remove(placeholder);
                inner.error = Some(IMAGE_FAILURE.to_string());
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    /// View elements for the current transcript: one bubble per entry, a
    /// typing indicator while a request is in flight, then a scroll anchor.
    pub fn render(&self) -> impl Iterator<Item = ViewElement> {
        let (entries, sending) = {
            let inner = self.lock();
            (inner.entries.clone(), inner.state == SessionState::Sending)
        };

        entries
            .into_iter()
            .map(ViewElement::Bubble)
            .chain(sending.then_some(ViewElement::TypingIndicator))
            .chain(iter::once(ViewElement::ScrollAnchor))
    }
}
