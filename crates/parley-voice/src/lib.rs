//! Voice I/O for the chat widget.
//!
//! The host platform's recognition and synthesis engines are injected as
//! [`SpeechRecognizer`] and [`SpeechSynthesizer`] so tests can drive them
//! with fakes. [`ChatWidget`] wires both adapters to a conversation with a
//! debounced voice-to-send path.

pub mod debounce;
pub mod error;
pub mod input;
pub mod output;
pub mod widget;

pub use debounce::{schedule_after, Debouncer, TimerHandle};
pub use error::VoiceError;
pub use input::{
    RecognitionError, RecognitionEvent, RecognitionSettings, SpeechInput, SpeechRecognizer,
    VoiceCaptureState,
};
pub use output::{
    select_voice, SpeechOutput, SpeechSynthesizer, SynthesisEvent, SynthesisSettings, Utterance,
    Voice,
};
pub use widget::ChatWidget;
