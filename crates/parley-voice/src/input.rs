//! Speech-input adapter.
//!
//! Turns the platform's continuous recognizer into a transcript stream:
//! - every result replaces the transcript (it is never concatenated),
//! - an explicit stop or a no-speech error ends capture and clears it,
//! - a platform end event ends capture but keeps the last transcript.

use std::sync::Arc;

use tokio::sync::watch;

use parley_core::config::VoiceConfig;

use crate::error::VoiceError;

/// How the recognizer should capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub continuous: bool,
    pub interim_results: bool,
    pub lang: String,
}

impl RecognitionSettings {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            continuous: true,
            interim_results: true,
            lang: config.recognition_lang.clone(),
        }
    }
}

/// Platform speech-recognition engine.
///
/// The engine is a process-wide singleton: `stop` halts whatever capture is
/// active on it, not only captures started through this trait object.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, settings: &RecognitionSettings) -> Result<(), VoiceError>;
    fn stop(&self);
}

/// Error codes reported by the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    NoSpeech,
    Aborted,
    AudioCapture,
    NotAllowed,
    Network,
    Other(String),
}

/// Callback from the recognizer, delivered through [`SpeechInput::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Most recent recognized segment (interim or final).
    Result { transcript: String },
    Error(RecognitionError),
    /// Capture ended on the platform's initiative.
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCaptureState {
    pub transcript: String,
    pub listening: bool,
}

pub struct SpeechInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    settings: RecognitionSettings,
    state: watch::Sender<VoiceCaptureState>,
}

impl SpeechInput {
    /// `recognizer` is `None` when the platform has no recognition support.
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, config: &VoiceConfig) -> Self {
        if recognizer.is_none() {
            tracing::warn!("Speech recognition is not supported on this platform");
        }
        let (state, _) = watch::channel(VoiceCaptureState::default());
        Self {
            recognizer,
            settings: RecognitionSettings::from_config(config),
            state,
        }
    }

    pub fn supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> VoiceCaptureState {
        self.state.borrow().clone()
    }

    pub fn is_listening(&self) -> bool {
        self.state.borrow().listening
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceCaptureState> {
        self.state.subscribe()
    }

    /// Start capture if idle, stop it if listening.
    pub fn toggle_listening(&self) -> Result<(), VoiceError> {
        let Some(recognizer) = &self.recognizer else {
            return Err(VoiceError::Unsupported("Speech recognition"));
        };

        if self.is_listening() {
            self.stop_listening();
            return Ok(());
        }

        recognizer.start(&self.settings)?;
        self.state.send_modify(|s| s.listening = true);
        tracing::debug!(lang = %self.settings.lang, "Listening started");
        Ok(())
    }

    /// Halt capture and clear the transcript. No-op when not listening.
    pub fn stop_listening(&self) {
        let Some(recognizer) = &self.recognizer else {
            return;
        };
        if !self.is_listening() {
            return;
        }
        recognizer.stop();
        self.state.send_modify(|s| {
            s.listening = false;
            s.transcript.clear();
        });
        tracing::debug!("Listening stopped");
    }

    pub fn handle_event(&self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Result { transcript } => {
                self.state.send_modify(|s| s.transcript = transcript);
            }
            RecognitionEvent::Error(RecognitionError::NoSpeech) => {
                tracing::debug!("No speech detected");
                self.state.send_modify(|s| {
                    s.listening = false;
                    s.transcript.clear();
                });
            }
            RecognitionEvent::Error(err) => {
                tracing::warn!(error = ?err, "Speech recognition error");
            }
            RecognitionEvent::End => {
                self.state.send_if_modified(|s| {
                    let was_listening = s.listening;
                    s.listening = false;
                    was_listening
                });
            }
        }
    }
}
