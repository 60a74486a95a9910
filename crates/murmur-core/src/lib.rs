//! Core murmur library: conversation model, wire codec, content
//! segmentation, reveal pacing, and the backend client.

pub mod api;
pub mod config;
pub mod content;
pub mod convo;
pub mod reveal;
pub mod session;
pub mod wire;

pub use api::{ApiError, ApiErrorKind, ApiResult, BackendClient, ListChanged, ListSignal};
pub use config::{BackendConfig, Config, RevealConfig};
pub use convo::{
    AssistantMessage, ContentKind, ContentPart, ConversationStore, Message, Reward,
    SelectionMemory, Turn, UserMessage, group_turns,
};
pub use reveal::{RevealEvent, RevealScheduler, RevealTiming};
pub use session::Session;
pub use wire::{OutboundFrame, decode_frame, encode_frame};
