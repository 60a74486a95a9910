//! HTTP backend client and the conversation-list change signal.
//!
//! The backend is a collaborator, not a source of truth the client blocks
//! on: a failed or malformed history fetch degrades to an empty
//! conversation, and a reward is only recorded locally after the backend
//! acknowledges it with HTTP 200.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use crate::config::BackendConfig;
use crate::convo::{Message, Reward};
use crate::wire;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Categories of backend errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Failed to parse the response body
    Parse,
    /// Connection-level failure
    Transport,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Transport => write!(f, "transport"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: u16) -> Self {
        Self::new(ApiErrorKind::HttpStatus, format!("HTTP {status}"))
    }

    fn from_request(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ApiErrorKind::Timeout, "request timed out")
        } else if err.is_decode() {
            Self::new(ApiErrorKind::Parse, err.to_string())
        } else {
            Self::new(ApiErrorKind::Transport, err.to_string())
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for backend operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// History response envelope.
#[derive(Debug, Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    data: Value,
}

/// Extracts messages from a history envelope.
///
/// A falsy status or non-array data yields an empty history; individual
/// entries that fail to decode are dropped with a warning.
fn parse_history(payload: &HistoryPayload) -> Vec<Message> {
    if !payload.status {
        warn!("history response reported failure; starting empty");
        return Vec::new();
    }
    let Some(entries) = payload.data.as_array() else {
        warn!("history data is not an array; starting empty");
        return Vec::new();
    };
    entries.iter().filter_map(wire::decode_value).collect()
}

/// Client for the conversation backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Transport, err.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Fetches the stored history of a conversation.
    ///
    /// Any failure degrades to an empty history so the client can always
    /// open the conversation.
    pub async fn fetch_history(&self, conversation_uid: &str) -> Vec<Message> {
        match self.request_history(conversation_uid).await {
            Ok(payload) => parse_history(&payload),
            Err(err) => {
                warn!(%err, conversation_uid, "history fetch failed; starting empty");
                Vec::new()
            }
        }
    }

    async fn request_history(&self, conversation_uid: &str) -> ApiResult<HistoryPayload> {
        let url = format!("{}/history", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("conversation", conversation_uid)])
            .send()
            .await
            .map_err(|err| ApiError::from_request(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::from_request(&err))
    }

    /// Submits a reward verdict for an assistant message within a
    /// conversation.
    ///
    /// Succeeds only on HTTP 200; the caller must not record the verdict
    /// locally until this returns `Ok`.
    pub async fn send_reward(
        &self,
        conversation_uid: &str,
        message_uid: &str,
        reward: Reward,
    ) -> ApiResult<()> {
        let url = format!("{}/reward", self.base_url);
        let body = serde_json::json!({
            "conversation_uid": conversation_uid,
            "text_uid": message_uid,
            "reward": reward,
        });
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::from_request(&err))?;

        let status = response.status();
        if status.as_u16() == 200 {
            Ok(())
        } else {
            Err(ApiError::http_status(status.as_u16()))
        }
    }

    /// Downloads the bytes of an image belonging to a conversation.
    ///
    /// A fully qualified URL is fetched as-is; anything else is treated as
    /// a backend image uid, looked up scoped to the conversation.
    pub async fn fetch_image(&self, conversation_uid: &str, image_ref: &str) -> ApiResult<Bytes> {
        let request = if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            self.http.get(image_ref)
        } else {
            self.http
                .get(format!("{}/image/{image_ref}", self.base_url))
                .query(&[("conversation", conversation_uid)])
        };
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::from_request(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(status.as_u16()));
        }
        response
            .bytes()
            .await
            .map_err(|err| ApiError::from_request(&err))
    }
}

/// Marker broadcast when the set of conversations changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChanged;

/// Broadcast channel for conversation-list changes.
///
/// Publishing never blocks; subscribers that lag simply miss markers and
/// refetch on the next one they see.
#[derive(Debug, Clone)]
pub struct ListSignal {
    sender: broadcast::Sender<ListChanged>,
}

impl Default for ListSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ListSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Announces that the conversation list changed.
    pub fn notify(&self) {
        // No subscribers is fine.
        let _ = self.sender.send(ListChanged);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListChanged> {
        self.sender.subscribe()
    }
}
