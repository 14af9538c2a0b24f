//! Error types for the flow-execution client.

/// Errors from a flow run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("API key or deployment id not configured")]
    MissingCredentials,
    #[error("{0}")]
    Transport(String),
    #[error("flow service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid flow response: {0}")]
    Decode(String),
    #[error("invalid flow id: {0}")]
    InvalidFlowId(String),
    #[error("invalid flow service URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FlowError::Decode(err.to_string())
        } else {
            FlowError::Transport(err.to_string())
        }
    }
}
