//! Conversation state manager.
//!
//! State lives in a `watch` channel: every mutation publishes a fresh
//! [`ChatSnapshot`], and the widget renders whatever it last received.
//!
//! Ordering within one manager:
//! - the user message is appended before the proxy call starts,
//! - the assistant message (reply or error) is appended after it settles,
//! - a send while another is pending is ignored, not queued.
//!
//! `reset_chat` bumps a generation counter. A request that settles under an
//! older generation is dropped so it cannot write into the new conversation.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use parley_core::types::{ChatMessage, ChatProxyRequest};

use crate::error::ChatError;
use crate::transport::ProxyTransport;

/// Placeholder shown when the flow answered with an empty output.
pub const NO_RESPONSE_TEXT: &str = "No response from AI.";
/// Message recorded when the chat flow id is not configured.
pub const MISSING_FLOW_ID: &str = "Missing Langflow Flow ID";

const UNKNOWN_ERROR: &str = "An unknown error occurred.";
const FAILED_RESPONSE: &str = "Failed to get a response.";

/// Observable state of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub session_id: String,
    /// Chronological, append-only until the next reset.
    pub messages: Vec<ChatMessage>,
    /// A proxy request is outstanding.
    pub pending: bool,
    pub last_error: Option<String>,
    /// Incremented by every reset.
    pub generation: u64,
}

impl ChatSnapshot {
    fn fresh(generation: u64) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            pending: false,
            last_error: None,
            generation,
        }
    }

    fn last_id(&self) -> Option<u64> {
        self.messages.last().map(|m| m.id)
    }
}

/// What a call to [`ConversationManager::send_message`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank text or a send already pending; nothing changed.
    Ignored,
    /// The proxy replied and the reply was appended.
    Replied,
    /// The proxy call failed; the error was recorded and appended.
    Failed(String),
    /// The chat was reset while the request was in flight; its result was dropped.
    Discarded,
}

/// Owns one conversation and drives it against the proxy.
pub struct ConversationManager {
    flow_id: Option<String>,
    transport: Arc<dyn ProxyTransport>,
    state: watch::Sender<ChatSnapshot>,
}

impl ConversationManager {
    /// Create a manager with a fresh session.
    ///
    /// `flow_id` is the conversational flow to address; without it every
    /// send fails with a configuration error.
    pub fn new(flow_id: Option<String>, transport: Arc<dyn ProxyTransport>) -> Self {
        let flow_id = flow_id.filter(|id| !id.trim().is_empty());
        if flow_id.is_none() {
            tracing::error!("Chat flow id is not set; messages will not be sent");
        }
        let (state, _) = watch::channel(ChatSnapshot::fresh(0));
        Self {
            flow_id,
            transport,
            state,
        }
    }

    /// Current state.
    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.borrow().clone()
    }

    /// Receive a notification on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    /// Send `text` to the flow and append the exchange to the history.
    ///
    /// Only a missing flow id is reported as `Err`; proxy failures are
    /// recorded in the state and returned as [`SendOutcome::Failed`].
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, ChatError> {
        if text.trim().is_empty() || self.is_pending() {
            return Ok(SendOutcome::Ignored);
        }

        let Some(flow_id) = self.flow_id.clone() else {
            let err = ChatError::Config(MISSING_FLOW_ID.to_string());
            self.state.send_modify(|s| s.last_error = Some(err.to_string()));
            return Err(err);
        };

        // Check-and-set under the channel lock so two racing callers cannot
        // both start a request.
        let mut started = None;
        self.state.send_if_modified(|s| {
            if s.pending {
                return false;
            }
            let message = ChatMessage::user(text, s.last_id());
            s.messages.push(message);
            s.pending = true;
            s.last_error = None;
            started = Some((s.generation, s.session_id.clone()));
            true
        });
        let Some((generation, session_id)) = started else {
            return Ok(SendOutcome::Ignored);
        };

        let request = ChatProxyRequest {
            message: text.to_string(),
            flow_id,
            session_id: Some(session_id),
        };
        tracing::debug!(generation, "Sending chat message");
        let result = self.transport.send(&request).await;

        let mut outcome = SendOutcome::Discarded;
        self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            match &result {
                Ok(reply) => {
                    let text = reply
                        .output_text()
                        .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
                    let message = ChatMessage::assistant(text, s.last_id());
                    s.messages.push(message);
                    outcome = SendOutcome::Replied;
                }
                Err(err) => {
                    let description = err.to_string();
                    let shown = if description.is_empty() {
                        FAILED_RESPONSE
                    } else {
                        description.as_str()
                    };
                    let message = ChatMessage::assistant(format!("Error: {}", shown), s.last_id());
                    s.messages.push(message);
                    s.last_error = Some(if description.is_empty() {
                        UNKNOWN_ERROR.to_string()
                    } else {
                        description.clone()
                    });
                    outcome = SendOutcome::Failed(description);
                }
            }
            s.pending = false;
            true
        });

        match &outcome {
            SendOutcome::Discarded => {
                tracing::debug!(generation, "Dropping response for a reset conversation");
            }
            SendOutcome::Failed(e) => tracing::warn!(error = %e, "Chat request failed"),
            _ => {}
        }
        Ok(outcome)
    }

    /// Start over: empty history, new session id, no error, not pending.
    pub fn reset_chat(&self) {
        self.state.send_modify(|s| {
            let generation = s.generation + 1;
            *s = ChatSnapshot::fresh(generation);
        });
        tracing::debug!("Chat reset");
    }
}
