//! Energy-based speech segmentation
//!
//! Splits a live sample stream into a single utterance: waits for speech to
//! start, accumulates it, and ends the utterance after trailing silence or
//! when the phrase limit is reached.

use std::time::Duration;

use super::SAMPLE_RATE;

/// Minimum audio energy threshold to consider speech
pub const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to count as an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration to consider end of utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Ambient level is scaled by this factor when calibrating
const AMBIENT_MARGIN: f32 = 1.5;

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech to start
    Waiting,
    /// Speech started, accumulating
    Speaking,
    /// Utterance ended by silence or phrase limit
    Complete,
    /// No speech started before the listen timeout
    TimedOut,
}

/// Segments one utterance out of streamed audio
#[derive(Debug)]
pub struct SpeechSegmenter {
    threshold: f32,
    timeout_samples: usize,
    phrase_limit_samples: usize,
    state: SegmenterState,
    waited: usize,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter
    ///
    /// # Arguments
    ///
    /// * `timeout` - Give up if no speech starts within this time
    /// * `phrase_limit` - Cut the utterance off after this much audio
    #[must_use]
    pub fn new(timeout: Duration, phrase_limit: Duration) -> Self {
        Self {
            threshold: ENERGY_THRESHOLD,
            timeout_samples: duration_to_samples(timeout),
            phrase_limit_samples: duration_to_samples(phrase_limit),
            state: SegmenterState::Waiting,
            waited: 0,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Raise the speech threshold above the ambient noise in `samples`
    ///
    /// The threshold never drops below [`ENERGY_THRESHOLD`].
    pub fn calibrate(&mut self, samples: &[f32]) {
        let ambient = calculate_energy(samples);
        self.threshold = (ambient * AMBIENT_MARGIN).max(ENERGY_THRESHOLD);
        tracing::debug!(ambient, threshold = self.threshold, "calibrated for ambient noise");
    }

    /// Process a chunk of samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> SegmenterState {
        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmenterState::Waiting => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                } else {
                    self.waited += samples.len();
                    if self.waited > self.timeout_samples {
                        tracing::debug!("no speech before timeout");
                        self.state = SegmenterState::TimedOut;
                    }
                }
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                tracing::trace!(
                    buffer_len = self.speech_buffer.len(),
                    silence = self.silence_counter,
                    is_speech,
                    energy,
                    "speaking"
                );

                if self.speech_buffer.len() >= self.phrase_limit_samples {
                    tracing::debug!(samples = self.speech_buffer.len(), "phrase limit reached");
                    self.speech_buffer.truncate(self.phrase_limit_samples);
                    self.state = SegmenterState::Complete;
                } else if self.silence_counter > SILENCE_SAMPLES {
                    if self.speech_buffer.len() - self.silence_counter > MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                        self.state = SegmenterState::Complete;
                    } else {
                        // too short, treat as noise
                        tracing::trace!("discarding short noise burst");
                        self.waited += self.speech_buffer.len();
                        self.speech_buffer.clear();
                        self.silence_counter = 0;
                        self.state = if self.waited > self.timeout_samples {
                            SegmenterState::TimedOut
                        } else {
                            SegmenterState::Waiting
                        };
                    }
                }
            }
            SegmenterState::Complete | SegmenterState::TimedOut => {}
        }

        self.state
    }

    /// Take the captured utterance, resetting for the next one
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let samples = std::mem::take(&mut self.speech_buffer);
        self.reset();
        samples
    }

    /// Reset to waiting
    pub fn reset(&mut self) {
        self.state = SegmenterState::Waiting;
        self.waited = 0;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Current speech threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_calculation() {
        let silence = vec![0.0f32; 100];
        assert!(calculate_energy(&silence) < 0.001);

        let loud = vec![0.5f32; 100];
        assert!(calculate_energy(&loud) > 0.4);
    }

    #[test]
    fn test_calibration_never_lowers_threshold() {
        let mut segmenter = SpeechSegmenter::new(Duration::from_secs(5), Duration::from_secs(7));
        segmenter.calibrate(&[0.0; 1600]);
        assert!((segmenter.threshold() - ENERGY_THRESHOLD).abs() < f32::EPSILON);

        segmenter.calibrate(&[0.1; 1600]);
        assert!(segmenter.threshold() > 0.1);
    }
}
