//! Error types for the voice adapters.

/// Errors from speech recognition or synthesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("speech recognizer error: {0}")]
    Recognizer(String),
}
