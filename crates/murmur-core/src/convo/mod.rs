//! Conversation data model: messages, the flat store, and turn grouping.

pub mod store;
pub mod turns;

pub use store::ConversationStore;
pub use turns::{SelectionMemory, Turn, group_turns};

use serde::{Deserialize, Serialize};

/// Atomic content unit as received from the backend, before segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub content: String,
}

impl ContentPart {
    /// Creates a plain text content part.
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Message,
            content: content.into(),
        }
    }

    /// Creates an image content part.
    pub fn image(content: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Image,
            content: content.into(),
        }
    }
}

/// Kind of a content part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Message,
}

/// User feedback on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reward {
    Good,
    Bad,
}

/// One user submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    /// Echoed input text.
    pub content: String,
    /// Regeneration counter supplied by the caller/backend.
    pub retry: u32,
}

/// One assistant response version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessage {
    /// Pre-segmentation content units.
    pub parts: Vec<ContentPart>,
    /// Regeneration counter matching the user submission it answers.
    pub retry: u32,
    /// Stable id used to correlate reward feedback.
    pub uid: Option<String>,
    /// Reward feedback; the only field mutable after append.
    pub reward: Option<Reward>,
}

impl AssistantMessage {
    /// Concatenated text of all message-kind parts.
    ///
    /// This is the input to reveal pacing; image parts contribute nothing.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for part in &self.parts {
            if part.kind == ContentKind::Message {
                text.push_str(&part.content);
            }
        }
        text
    }
}

/// A chat message, discriminated by role.
///
/// Fields are probed per-role by construction rather than through optional
/// fields; the renderer matches exhaustively on the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    /// Regeneration counter, regardless of role.
    pub fn retry(&self) -> u32 {
        match self {
            Message::User(user) => user.retry,
            Message::Assistant(assistant) => assistant.retry,
        }
    }

    /// Returns the user payload if this is a user message.
    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Message::User(user) => Some(user),
            Message::Assistant(_) => None,
        }
    }

    /// Returns the assistant payload if this is an assistant message.
    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::User(_) => None,
            Message::Assistant(assistant) => Some(assistant),
        }
    }
}
