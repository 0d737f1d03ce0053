//! Speech capture collaborator
//!
//! `listen` records a single utterance and returns its transcript, or an
//! empty string on timeout or recognition failure. A microphone that cannot
//! be opened degrades to a permanent error string.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::segmenter::{SegmenterState, SpeechSegmenter};
use super::stt::SpeechToText;
use crate::config::VoiceConfig;
use crate::Result;

/// Returned by every capture once the microphone failed to open
pub const MIC_ERROR: &str = "[Microphone error: unable to access mic]";

/// Audio gathered for ambient-noise calibration
const CALIBRATION: Duration = Duration::from_millis(500);

/// Interval between buffer polls (100ms at 16kHz)
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Produces one transcribed utterance per call
#[async_trait]
pub trait Listener: Send + Sync {
    /// Capture and transcribe one utterance
    ///
    /// Never fails: timeouts and recognition errors yield an empty string.
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> String;
}

/// Whether a capture result is a device error rather than speech
#[must_use]
pub fn is_capture_error(text: &str) -> bool {
    text.starts_with("[Microphone error")
}

/// Listens on the default microphone and transcribes with Whisper
pub struct MicrophoneListener {
    stt: Option<SpeechToText>,
    mic_failed: AtomicBool,
}

impl MicrophoneListener {
    /// Create a listener from voice configuration
    #[must_use]
    pub fn new(config: &VoiceConfig) -> Self {
        let stt = config.stt_api_key.clone().and_then(|key| {
            SpeechToText::new(key, config.stt_model.clone())
                .map_err(|e| tracing::warn!(error = %e, "speech recognition disabled"))
                .ok()
        });

        if stt.is_none() {
            tracing::warn!("no STT API key configured, voice captures will be empty");
        }

        Self {
            stt,
            mic_failed: AtomicBool::new(false),
        }
    }
}

impl std::fmt::Debug for MicrophoneListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicrophoneListener")
            .field("stt", &self.stt)
            .field("mic_failed", &self.mic_failed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl Listener for MicrophoneListener {
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> String {
        if self.mic_failed.load(Ordering::Relaxed) {
            return MIC_ERROR.to_string();
        }

        let recorded =
            tokio::task::spawn_blocking(move || record_utterance(timeout, phrase_limit)).await;

        let samples = match recorded {
            Ok(Ok(Some(samples))) => samples,
            Ok(Ok(None)) => return String::new(),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "microphone unavailable");
                self.mic_failed.store(true, Ordering::Relaxed);
                return MIC_ERROR.to_string();
            }
            Err(e) => {
                tracing::error!(error = %e, "capture task failed");
                return String::new();
            }
        };

        let Some(stt) = &self.stt else {
            return String::new();
        };

        let transcript = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => stt.transcribe(&wav).await,
            Err(e) => Err(e),
        };

        match transcript {
            Ok(text) => clean_transcript(&text),
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                String::new()
            }
        }
    }
}

/// Lower-case a transcript and drop trailing sentence punctuation
#[must_use]
pub fn clean_transcript(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_lowercase()
}

/// Record one utterance from the default microphone
///
/// Blocks the calling thread. Returns `Ok(None)` if no speech started before
/// `timeout`.
///
/// # Errors
///
/// Returns error if the microphone cannot be opened or started
pub fn record_utterance(timeout: Duration, phrase_limit: Duration) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::open()?;
    capture.start()?;

    let mut segmenter = SpeechSegmenter::new(timeout, phrase_limit);

    std::thread::sleep(CALIBRATION);
    segmenter.calibrate(&capture.take_buffer());

    // stalled devices deliver nothing; bound the wait on wall-clock time
    let deadline = Instant::now() + CALIBRATION + timeout + phrase_limit + Duration::from_secs(1);

    while Instant::now() < deadline {
        std::thread::sleep(POLL_INTERVAL);

        let samples = capture.take_buffer();
        if samples.is_empty() {
            continue;
        }

        match segmenter.process(&samples) {
            SegmenterState::Complete => return Ok(Some(segmenter.take_utterance())),
            SegmenterState::TimedOut => return Ok(None),
            SegmenterState::Waiting | SegmenterState::Speaking => {}
        }
    }

    tracing::warn!(state = ?segmenter.state(), "audio stream stalled");
    if segmenter.state() == SegmenterState::Speaking {
        return Ok(Some(segmenter.take_utterance()));
    }
    Ok(None)
}
