//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::time::Duration;

use cs2p::voice::{
    SAMPLE_RATE, SegmenterState, SpeechSegmenter, clean_transcript, samples_to_wav,
};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed audio in 100ms chunks, returning the final state
fn feed(segmenter: &mut SpeechSegmenter, samples: &[f32]) -> SegmenterState {
    let mut state = segmenter.state();
    for chunk in samples.chunks(1600) {
        state = segmenter.process(chunk);
    }
    state
}

fn segmenter() -> SpeechSegmenter {
    SpeechSegmenter::new(Duration::from_secs(5), Duration::from_secs(7))
}

#[test]
fn test_segmenter_starts_waiting() {
    let segmenter = segmenter();
    assert_eq!(segmenter.state(), SegmenterState::Waiting);
}

#[test]
fn test_silence_keeps_waiting() {
    let mut segmenter = segmenter();
    assert_eq!(feed(&mut segmenter, &generate_silence(1.0)), SegmenterState::Waiting);
}

#[test]
fn test_speech_then_silence_completes() {
    let mut segmenter = segmenter();

    let speech = generate_sine_samples(440.0, 0.8, 0.3);
    assert_eq!(feed(&mut segmenter, &speech), SegmenterState::Speaking);

    let state = feed(&mut segmenter, &generate_silence(0.7));
    assert_eq!(state, SegmenterState::Complete);

    let utterance = segmenter.take_utterance();
    assert!(utterance.len() >= speech.len());
    assert_eq!(segmenter.state(), SegmenterState::Waiting);
}

#[test]
fn test_no_speech_times_out() {
    let mut segmenter = SpeechSegmenter::new(Duration::from_secs(1), Duration::from_secs(7));
    assert_eq!(feed(&mut segmenter, &generate_silence(1.5)), SegmenterState::TimedOut);
}

#[test]
fn test_short_noise_is_discarded() {
    let mut segmenter = segmenter();

    feed(&mut segmenter, &generate_sine_samples(440.0, 0.1, 0.3));
    let state = feed(&mut segmenter, &generate_silence(0.7));
    assert_eq!(state, SegmenterState::Waiting);
}

#[test]
fn test_phrase_limit_cuts_utterance() {
    let mut segmenter = SpeechSegmenter::new(Duration::from_secs(5), Duration::from_secs(1));

    let state = feed(&mut segmenter, &generate_sine_samples(440.0, 2.0, 0.3));
    assert_eq!(state, SegmenterState::Complete);
    assert_eq!(segmenter.take_utterance().len(), SAMPLE_RATE as usize);
}

#[test]
fn test_calibration_ignores_ambient_hum() {
    let mut segmenter = segmenter();
    segmenter.calibrate(&generate_sine_samples(60.0, 0.5, 0.1));

    // hum at the calibrated level no longer counts as speech
    let state = feed(&mut segmenter, &generate_sine_samples(60.0, 0.5, 0.1));
    assert_eq!(state, SegmenterState::Waiting);

    let state = feed(&mut segmenter, &generate_sine_samples(440.0, 0.5, 0.5));
    assert_eq!(state, SegmenterState::Speaking);
}

#[test]
fn test_transcript_cleanup() {
    assert_eq!(clean_transcript("Search Google for cats."), "search google for cats");
    assert_eq!(clean_transcript("  C2!  "), "c2");
}

#[test]
fn test_utterance_wav_is_clamped_pcm() {
    let wav = samples_to_wav(&[0.0, 0.5, -0.5, 1.5, -1.5], SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);

    let pcm: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(pcm, [0, 16383, -16383, i16::MAX, i16::MIN]);
}
