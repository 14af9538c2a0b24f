//! Speech-output adapter.
//!
//! At most one utterance is ever outstanding: `speak` cancels whatever is
//! playing before handing the next utterance to the engine. Each utterance
//! carries an id, and engine events for superseded utterances are ignored.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use parley_core::config::VoiceConfig;

/// A voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    /// The platform's default voice.
    pub default: bool,
}

impl Voice {
    pub fn new(name: &str, lang: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.to_string(),
            default,
        }
    }
}

/// Fixed speech parameters applied to every utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    pub lang: String,
    pub preferred_voice: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SynthesisSettings {
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            lang: config.synthesis_lang.clone(),
            preferred_voice: config.preferred_voice.clone(),
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    /// `None` lets the engine use its own default voice.
    pub voice: Option<Voice>,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Platform speech-synthesis engine.
///
/// Like the recognizer this is a shared singleton; `cancel` silences any
/// utterance on the engine. Both `speak` and `cancel` are called with the
/// adapter's lock held, so engines must report events through
/// [`SpeechOutput::handle_event`] asynchronously, never from inside them.
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;
    fn speak(&self, utterance: Utterance);
    fn cancel(&self);
}

/// Utterance lifecycle callbacks, delivered through [`SpeechOutput::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Start(u64),
    End(u64),
    Error { id: u64, message: String },
}

/// Pick a voice for `lang`.
///
/// Order: the preferred voice in that language, the platform default in that
/// language, any voice in that language, the first voice at all.
pub fn select_voice(voices: &[Voice], preferred: &str, lang: &str) -> Option<Voice> {
    let in_lang = |v: &&Voice| v.lang.starts_with(lang);
    voices
        .iter()
        .filter(in_lang)
        .find(|v| v.name == preferred)
        .or_else(|| voices.iter().filter(in_lang).find(|v| v.default))
        .or_else(|| voices.iter().find(in_lang))
        .or_else(|| voices.first())
        .cloned()
}

#[derive(Debug, Default)]
struct Playback {
    voices: Vec<Voice>,
    current: Option<u64>,
    next_id: u64,
}

pub struct SpeechOutput {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    settings: SynthesisSettings,
    playback: Mutex<Playback>,
    speaking: watch::Sender<bool>,
}

impl SpeechOutput {
    /// `synthesizer` is `None` when the platform has no synthesis support.
    pub fn new(synthesizer: Option<Arc<dyn SpeechSynthesizer>>, config: &VoiceConfig) -> Self {
        let voices = synthesizer.as_ref().map(|s| s.voices()).unwrap_or_default();
        let (speaking, _) = watch::channel(false);
        Self {
            synthesizer,
            settings: SynthesisSettings::from_config(config),
            playback: Mutex::new(Playback {
                voices,
                ..Playback::default()
            }),
            speaking,
        }
    }

    pub fn supported(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn speaking(&self) -> bool {
        *self.speaking.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.speaking.subscribe()
    }

    fn playback(&self) -> MutexGuard<'_, Playback> {
        self.playback.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-read the voice list (the platform's voices-changed notification).
    pub fn refresh_voices(&self) {
        if let Some(synth) = &self.synthesizer {
            let voices = synth.voices();
            tracing::debug!(count = voices.len(), "Voice list refreshed");
            self.playback().voices = voices;
        }
    }

    pub fn speak(&self, text: &str) {
        let Some(synth) = &self.synthesizer else {
            tracing::warn!("Speech synthesis not supported; nothing spoken");
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        // The engine call happens under the playback lock so a concurrent
        // `cancel` or `speak` cannot slip between registering the id and
        // handing the utterance over.
        let mut playback = self.playback();
        if playback.current.is_some() || self.speaking() {
            synth.cancel();
            self.speaking.send_replace(false);
        }

        let voice = select_voice(
            &playback.voices,
            &self.settings.preferred_voice,
            &self.settings.lang,
        );
        if voice.is_none() {
            tracing::warn!(
                preferred = %self.settings.preferred_voice,
                "Preferred voice not found; using the platform default"
            );
        }

        playback.next_id += 1;
        let id = playback.next_id;
        playback.current = Some(id);
        synth.speak(Utterance {
            id,
            text: text.to_string(),
            voice,
            lang: self.settings.lang.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        });
    }

    /// Silence the engine now, without waiting for its end event.
    pub fn cancel(&self) {
        let Some(synth) = &self.synthesizer else {
            return;
        };
        let mut playback = self.playback();
        synth.cancel();
        playback.current = None;
        self.speaking.send_replace(false);
    }

    pub fn handle_event(&self, event: SynthesisEvent) {
        let mut playback = self.playback();
        match event {
            SynthesisEvent::Start(id) if playback.current == Some(id) => {
                self.speaking.send_replace(true);
            }
            SynthesisEvent::End(id) if playback.current == Some(id) => {
                playback.current = None;
                self.speaking.send_replace(false);
            }
            SynthesisEvent::Error { id, message } if playback.current == Some(id) => {
                tracing::warn!(error = %message, "Speech synthesis error");
                playback.current = None;
                self.speaking.send_replace(false);
            }
            stale => {
                tracing::debug!(event = ?stale, "Ignoring event for a superseded utterance");
            }
        }
    }
}
