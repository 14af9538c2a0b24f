//! Chat widget glue: voice capture, speech output and the conversation.
//!
//! A transcript that stops changing for the debounce interval while the
//! microphone is live is submitted as a message. Typed submissions take the
//! same path without the wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use parley_chat::{ChatError, ConversationManager, SendOutcome};
use parley_core::config::VoiceConfig;
use parley_core::types::Sender;

use crate::debounce::Debouncer;
use crate::input::SpeechInput;
use crate::output::SpeechOutput;

pub struct ChatWidget {
    chat: Arc<ConversationManager>,
    input: Arc<SpeechInput>,
    output: Arc<SpeechOutput>,
    debounce: Duration,
    auto_speak: bool,
}

impl ChatWidget {
    pub fn new(
        chat: Arc<ConversationManager>,
        input: Arc<SpeechInput>,
        output: Arc<SpeechOutput>,
        config: &VoiceConfig,
    ) -> Self {
        Self {
            chat,
            input,
            output,
            debounce: Duration::from_millis(config.debounce_ms),
            auto_speak: config.auto_speak,
        }
    }

    pub fn chat(&self) -> &Arc<ConversationManager> {
        &self.chat
    }

    pub fn input(&self) -> &Arc<SpeechInput> {
        &self.input
    }

    pub fn output(&self) -> &Arc<SpeechOutput> {
        &self.output
    }

    /// Form-submit path: silence the microphone and the speaker, then send.
    pub async fn submit_typed(&self, text: &str) -> Result<SendOutcome, ChatError> {
        self.input.stop_listening();
        self.output.cancel();
        self.chat.send_message(text).await
    }

    /// Watch the capture state and submit settled transcripts.
    ///
    /// The debounce is re-armed on every transcript change while listening
    /// and cancelled as soon as listening stops or the transcript empties.
    /// The baseline is read before the task starts, so state published
    /// before its first poll still counts as a change. Aborting the returned
    /// task cancels any armed timer.
    pub fn spawn_voice_loop(&self) -> JoinHandle<()> {
        let mut rx = self.input.subscribe();
        let debouncer = Debouncer::new(self.debounce);
        let submit = VoiceSubmit {
            chat: Arc::clone(&self.chat),
            input: Arc::clone(&self.input),
            output: Arc::clone(&self.output),
        };

        let mut last = rx.borrow_and_update().clone();
        if last.listening && !last.transcript.trim().is_empty() {
            submit.arm(&debouncer, last.transcript.clone());
        }

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                if state == last {
                    continue;
                }
                last = state.clone();

                if !state.listening || state.transcript.trim().is_empty() {
                    debouncer.cancel();
                    continue;
                }
                submit.arm(&debouncer, state.transcript);
            }
        })
    }

    /// Speak each new assistant message once. `None` unless `auto_speak` is
    /// on and the platform can synthesize speech.
    pub fn spawn_reply_reader(&self) -> Option<JoinHandle<()>> {
        if !self.auto_speak || !self.output.supported() {
            return None;
        }

        let mut rx = self.chat.subscribe();
        let output = Arc::clone(&self.output);
        let mut last_seen = rx.borrow_and_update().messages.last().map(|m| m.id);

        Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().messages.last().cloned();
                let Some(message) = latest else {
                    last_seen = None;
                    continue;
                };
                if last_seen == Some(message.id) {
                    continue;
                }
                last_seen = Some(message.id);
                if message.sender == Sender::Assistant {
                    output.speak(&message.text);
                }
            }
        }))
    }
}

/// What the debounced voice submit needs to reach.
struct VoiceSubmit {
    chat: Arc<ConversationManager>,
    input: Arc<SpeechInput>,
    output: Arc<SpeechOutput>,
}

impl VoiceSubmit {
    fn arm(&self, debouncer: &Debouncer, transcript: String) {
        let chat = Arc::clone(&self.chat);
        let input = Arc::clone(&self.input);
        let output = Arc::clone(&self.output);
        debouncer.trigger(move || {
            tracing::debug!("Transcript settled; submitting");
            input.stop_listening();
            output.cancel();
            tokio::spawn(async move {
                if let Err(e) = chat.send_message(&transcript).await {
                    tracing::warn!(error = %e, "Voice message not sent");
                }
            });
        });
    }
}
