use chrono::Utc;
use serde::{Deserialize, Serialize};

// =============================================================================
// Chat history
// =============================================================================

/// Who authored a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The site visitor.
    #[serde(rename = "user")]
    User,
    /// The conversational flow (or an error surfaced in its place).
    #[serde(rename = "ai")]
    Assistant,
}

/// A single entry in the visible conversation history.
///
/// Messages are immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Millisecond-timestamp derived id, strictly increasing within a session.
    pub id: u64,
    pub text: String,
    pub sender: Sender,
}

impl ChatMessage {
    /// Build a message whose id follows `previous` (the id of the last message
    /// in the history, if any).
    pub fn new(text: impl Into<String>, sender: Sender, previous: Option<u64>) -> Self {
        Self {
            id: next_message_id(previous),
            text: text.into(),
            sender,
        }
    }

    pub fn user(text: impl Into<String>, previous: Option<u64>) -> Self {
        Self::new(text, Sender::User, previous)
    }

    pub fn assistant(text: impl Into<String>, previous: Option<u64>) -> Self {
        Self::new(text, Sender::Assistant, previous)
    }
}

/// Current wall-clock milliseconds, bumped past `previous` when two messages
/// land in the same millisecond.
pub fn next_message_id(previous: Option<u64>) -> u64 {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    match previous {
        Some(prev) if now <= prev => prev + 1,
        _ => now,
    }
}

// =============================================================================
// Proxy wire types
// =============================================================================

/// Body of `POST /chat`.
///
/// Fields default to empty so that a body missing `message` or `flowId`
/// still deserializes and can be rejected with a client error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatProxyRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub flow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatProxyRequest {
    /// Whether both required fields are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.message.is_empty() && !self.flow_id.is_empty()
    }

    /// The session id, treating an empty string as absent.
    pub fn session(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Whether `id` can name a flow: non-empty ASCII letters, digits, `-` or `_`.
///
/// Flow ids become a URL path segment on the key-bearing upstream request,
/// so anything else is refused.
pub fn is_valid_flow_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Successful `POST /chat` response.
///
/// `output` is the flow's chat text when it produced one, otherwise the raw
/// structured outputs of the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatProxyResponse {
    pub output: serde_json::Value,
}

impl ChatProxyResponse {
    /// Render `output` as user-facing text. Returns `None` for null or empty
    /// output so callers can substitute a placeholder.
    pub fn output_text(&self) -> Option<String> {
        match &self.output {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
