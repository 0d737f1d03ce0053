//! Voice processing module
//!
//! Microphone capture, utterance segmentation, Whisper transcription and
//! spoken replies.

mod capture;
mod listener;
mod segmenter;
mod speaker;
mod stt;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use listener::{
    Listener, MIC_ERROR, MicrophoneListener, clean_transcript, is_capture_error, record_utterance,
};
pub use segmenter::{ENERGY_THRESHOLD, SegmenterState, SpeechSegmenter, calculate_energy};
pub use speaker::{ProcessSynthesizer, SilentSynthesizer, Speaker, Synthesizer};
pub use stt::SpeechToText;
