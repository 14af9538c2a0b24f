//! Error types for the conversation manager.

/// Errors from the chat client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Chat configuration error: {0}")]
    Config(String),
    /// The proxy answered with an error; carries its message.
    #[error("{0}")]
    Proxy(String),
    #[error("{0}")]
    Transport(String),
    #[error("invalid proxy response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
