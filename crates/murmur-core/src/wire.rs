//! Wire frame codec for the persistent chat connection.
//!
//! Inbound frames are JSON text payloads. A malformed frame is dropped
//! (decode returns `None`) and logged; it never fails the connection.
//! One outbound call produces exactly one logical unit, but the backend
//! may answer a single outbound frame with many inbound frames.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::convo::{AssistantMessage, ContentKind, ContentPart, Message, Reward, UserMessage};

/// One content part on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePart {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireRole {
    User,
    Llm,
}

/// Inbound frame payload as sent by the backend.
///
/// History entries reuse the same shape, with `retry`, `reward`, and
/// `text_uid` filled in.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    role: WireRole,
    #[serde(default)]
    text_content: Vec<WirePart>,
    #[serde(default)]
    retry: u32,
    #[serde(default)]
    reward: Option<Reward>,
    #[serde(default)]
    text_uid: Option<String>,
}

impl InboundFrame {
    fn into_message(self) -> Message {
        match self.role {
            WireRole::User => {
                let mut content = String::new();
                for part in &self.text_content {
                    if part.kind == ContentKind::Message {
                        content.push_str(&part.content);
                    }
                }
                Message::User(UserMessage {
                    content: normalize_line_breaks(&content),
                    retry: self.retry,
                })
            }
            WireRole::Llm => Message::Assistant(AssistantMessage {
                parts: self
                    .text_content
                    .into_iter()
                    .map(|part| ContentPart {
                        kind: part.kind,
                        content: normalize_line_breaks(&part.content),
                    })
                    .collect(),
                retry: self.retry,
                uid: self.text_uid,
                reward: self.reward,
            }),
        }
    }
}

/// Converts escaped newline sequences into literal line breaks.
///
/// The backend serializes line breaks as two-character escapes inside the
/// JSON string payload; segmentation expects real line breaks.
fn normalize_line_breaks(text: &str) -> String {
    text.replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "\n")
}

/// Decodes one inbound frame. Malformed frames are dropped with a warning.
pub fn decode_frame(raw: &str) -> Option<Message> {
    let frame: InboundFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "dropping malformed inbound frame");
            return None;
        }
    };
    Some(frame.into_message())
}

/// Decodes one history entry (already-parsed JSON value).
pub(crate) fn decode_value(value: &serde_json::Value) -> Option<Message> {
    let frame: InboundFrame = match serde_json::from_value(value.clone()) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "dropping malformed history entry");
            return None;
        }
    };
    Some(frame.into_message())
}

/// Outbound frame wrapping exactly one content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundFrame {
    pub conversation_uid: String,
    pub text_content: Vec<WirePart>,
}

/// Encodes outbound user text for the given conversation.
pub fn encode_frame(text: &str, conversation_uid: &str) -> OutboundFrame {
    OutboundFrame {
        conversation_uid: conversation_uid.to_string(),
        text_content: vec![WirePart {
            kind: ContentKind::Message,
            content: text.to_string(),
        }],
    }
}
