//! Conversation session: the facade wiring the store, turn grouping,
//! reveal pacing, and the backend client together.
//!
//! Live inbound frames flow through here so assistant messages get queued
//! for paced reveal; history loads bypass the scheduler entirely and
//! appear at once. Switching conversations resets everything: store,
//! selection memory, and any in-flight reveals.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::api::{ApiResult, BackendClient};
use crate::config::Config;
use crate::convo::{ConversationStore, Message, Reward, SelectionMemory, Turn, UserMessage, group_turns};
use crate::reveal::{RevealEvent, RevealScheduler};
use crate::wire::{self, OutboundFrame};

/// One active conversation session.
pub struct Session {
    conversation_uid: String,
    store: ConversationStore,
    selection: SelectionMemory,
    scheduler: RevealScheduler,
    client: BackendClient,
}

impl Session {
    /// Creates a session with no active conversation. Reveal events for
    /// the UI arrive on the returned receiver.
    pub fn new(config: &Config) -> ApiResult<(Self, UnboundedReceiver<RevealEvent>)> {
        let client = BackendClient::new(&config.backend)?;
        let (scheduler, events) = RevealScheduler::spawn(config.reveal.timing());
        Ok((
            Self {
                conversation_uid: String::new(),
                store: ConversationStore::new(),
                selection: SelectionMemory::new(),
                scheduler,
                client,
            },
            events,
        ))
    }

    pub fn conversation_uid(&self) -> &str {
        &self.conversation_uid
    }

    /// Switches to `conversation_uid`, fetching its stored history.
    ///
    /// A failed fetch degrades to an empty conversation. Loaded history is
    /// shown at once; the reveal queue and selection memory are wiped so
    /// nothing from the previous conversation leaks through.
    pub async fn activate(&mut self, conversation_uid: &str) {
        let history = self.client.fetch_history(conversation_uid).await;
        self.replace_history(conversation_uid, history);
    }

    /// Resets the session onto already-fetched history.
    pub fn replace_history(&mut self, conversation_uid: &str, history: Vec<Message>) {
        debug!(conversation_uid, messages = history.len(), "activating conversation");
        self.scheduler.clear();
        self.selection.reset();
        self.store.load_history(history);
        self.conversation_uid = conversation_uid.to_string();
    }

    /// Handles one raw inbound frame.
    ///
    /// A malformed frame is dropped and leaves the session untouched.
    /// Assistant messages are queued for paced reveal before landing in
    /// the store; user echoes land directly. Returns whether the frame
    /// was accepted.
    pub fn handle_frame(&mut self, raw: &str) -> bool {
        let Some(message) = wire::decode_frame(raw) else {
            return false;
        };
        if let Some(assistant) = message.as_assistant() {
            self.scheduler.enqueue(assistant.uid.clone(), assistant.text());
        }
        self.store.append_live(message);
        true
    }

    /// Records the user's submission locally and returns the frame to put
    /// on the wire. The local echo keeps the transcript responsive while
    /// the backend works.
    pub fn send_text(&mut self, text: &str, retry: u32) -> OutboundFrame {
        self.store.append_live(Message::User(UserMessage {
            content: text.to_string(),
            retry,
        }));
        wire::encode_frame(text, &self.conversation_uid)
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// The grouped turn view with sticky version selection applied.
    pub fn turns(&mut self) -> Vec<Turn> {
        let mut turns = group_turns(self.store.messages());
        self.selection.reconcile(&mut turns);
        turns
    }

    /// Selects a version for the turn anchored at `user_index`.
    pub fn choose_version(&mut self, user_index: usize, version: usize) {
        self.selection.choose(user_index, version);
    }

    /// Submits a reward verdict and records it locally only after the
    /// backend acknowledges it. Returns whether a local message carried
    /// the uid.
    pub async fn confirm_reward(&mut self, message_uid: &str, reward: Reward) -> ApiResult<bool> {
        self.client
            .send_reward(&self.conversation_uid, message_uid, reward)
            .await?;
        Ok(self.store.set_reward(message_uid, reward))
    }

    /// Stops the reveal driver task.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
