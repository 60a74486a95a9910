//! Flat, append-only message list for the active conversation.
//!
//! Store order equals arrival order. Turn grouping is a derived view and
//! never mutates the store; the only post-append mutation is reward
//! feedback, which is idempotently overwritable.

use super::{Message, Reward};

/// The ordered flat message list for one conversation.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the store wholesale (conversation activation).
    pub fn load_history(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Appends one message in arrival order. Never reorders or dedupes.
    pub fn append_live(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Sets the reward on the assistant message with the given stable id.
    ///
    /// Returns false when no message carries that id. Calling twice with
    /// different values keeps the latest (idempotent overwrite).
    pub fn set_reward(&mut self, uid: &str, reward: Reward) -> bool {
        for message in &mut self.messages {
            if let Message::Assistant(assistant) = message
                && assistant.uid.as_deref() == Some(uid)
            {
                assistant.reward = Some(reward);
                return true;
            }
        }
        false
    }
}
