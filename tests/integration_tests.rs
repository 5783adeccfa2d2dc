//! Integration tests for the chord transcription engine

use stratum_chords::io::decode_audio;
use stratum_chords::{
    transcribe_audio, transcribe_file, ChordSegment, ChordTranscriber, FixedBeatGrid,
    TranscriptionConfig,
};
use std::f32::consts::PI;
use std::path::PathBuf;

const SAMPLE_RATE: u32 = 22050;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Frequency at the center of the 3-bin group for `semitone` above `base`
fn centered_frequency(base: f32, semitone: i32) -> f32 {
    base * 2f32.powf((3 * semitone + 1) as f32 / 36.0)
}

/// Sum of equal-amplitude sines
fn tones(frequencies: &[f32], seconds: f32) -> Vec<f32> {
    let n = (seconds * SAMPLE_RATE as f32) as usize;
    let gain = 0.8 / frequencies.len() as f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            frequencies
                .iter()
                .map(|f| (2.0 * PI * f * t).sin())
                .sum::<f32>()
                * gain
        })
        .collect()
}

/// C1 bass plus a C4-E4-G4 triad
fn c_major(seconds: f32) -> Vec<f32> {
    let c1 = 32.703_197;
    let c2 = 65.406_39;
    tones(
        &[
            centered_frequency(c1, 0),
            centered_frequency(c2, 24),
            centered_frequency(c2, 28),
            centered_frequency(c2, 31),
        ],
        seconds,
    )
}

fn assert_contiguous(segments: &[ChordSegment], duration: f32) {
    assert!(!segments.is_empty());
    assert_eq!(segments[0].start, 0.0);
    assert!(
        (segments.last().unwrap().end - duration).abs() < 1e-4,
        "last segment should end at {}, got {:?}",
        duration,
        segments.last()
    );
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "gap or overlap: {:?}", pair);
    }
    assert!(segments.iter().all(|s| s.start < s.end));
}

fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("stratum_chords_{}_{}.wav", std::process::id(), name))
}

#[test]
fn test_c_major_triad_single_segment() {
    init_logger();

    let samples = c_major(2.0);
    let transcriber = ChordTranscriber::new(TranscriptionConfig::default())
        .unwrap()
        .with_beat_tracker(Box::new(FixedBeatGrid::new(vec![0.0, 2.0], 30.0)));

    let result = transcriber.transcribe(&samples, SAMPLE_RATE).unwrap();
    let segments = &result.segments;
    assert_contiguous(segments, 2.0);

    // The first sub-beat is pinned to "N" by the initial state distribution
    let first_subbeat_end = 5.0 * 2048.0 / SAMPLE_RATE as f32;
    let chord = segments.last().unwrap();
    assert_eq!(chord.label, "C", "segments: {:?}", segments);
    assert!((chord.end - 2.0).abs() < 1e-6);
    assert!(
        chord.start <= first_subbeat_end + 1e-4,
        "C should start within the first sub-beat, got {:?}",
        segments
    );
    assert!(segments[..segments.len() - 1].iter().all(|s| s.label == "N"));

    assert_eq!(result.beats.len(), 2);
    assert_eq!(result.metadata.subbeat_count, 4);
}

#[test]
fn test_a_minor_triad_detected() {
    init_logger();

    // A1 bass plus A3-C4-E4
    let c1 = 32.703_197;
    let c2 = 65.406_39;
    let samples = tones(
        &[
            centered_frequency(c1, 9),
            centered_frequency(c2, 21),
            centered_frequency(c2, 24),
            centered_frequency(c2, 28),
        ],
        2.0,
    );

    let transcriber = ChordTranscriber::new(TranscriptionConfig::default())
        .unwrap()
        .with_beat_tracker(Box::new(FixedBeatGrid::new(vec![0.0, 2.0], 30.0)));
    let result = transcriber.transcribe(&samples, SAMPLE_RATE).unwrap();

    assert_contiguous(&result.segments, 2.0);
    assert_eq!(result.segments.last().unwrap().label, "Am");
}

#[test]
fn test_silence_single_no_chord() {
    init_logger();

    let samples = vec![0.0f32; SAMPLE_RATE as usize * 3];
    let result = transcribe_audio(&samples, SAMPLE_RATE, TranscriptionConfig::default()).unwrap();

    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].label, "N");
    assert_contiguous(&result.segments, 3.0);
    assert_eq!(result.tempo_bpm, 0.0);
}

#[test]
fn test_default_beat_tracker_covers_duration() {
    init_logger();

    let samples = c_major(4.0);
    let result = transcribe_audio(&samples, SAMPLE_RATE, TranscriptionConfig::default()).unwrap();

    assert_contiguous(&result.segments, 4.0);
    assert!((result.metadata.duration_seconds - 4.0).abs() < 1e-6);
    assert!(result.metadata.subbeat_count >= 1);
}

#[test]
fn test_transcription_json_output() {
    let samples = vec![0.0f32; SAMPLE_RATE as usize];
    let result = transcribe_audio(&samples, SAMPLE_RATE, TranscriptionConfig::default()).unwrap();

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["segments"][0]["label"], "N");
    assert_eq!(value["segments"][0]["start"], 0.0);
    assert_eq!(value["metadata"]["sample_rate"], SAMPLE_RATE);
}

#[test]
fn test_wav_round_trip_through_decoder() {
    init_logger();

    let path = temp_wav("stereo");
    let samples = c_major(1.0);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    {
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in &samples {
            let value = (s * i16::MAX as f32) as i16;
            writer.write_sample(value).unwrap();
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }

    let (decoded, sample_rate) = decode_audio(&path).unwrap();
    assert_eq!(sample_rate, SAMPLE_RATE);
    assert_eq!(decoded.len(), samples.len());
    for (a, b) in decoded.iter().zip(samples.iter()).step_by(97) {
        assert!((a - b).abs() < 1e-3, "decoded {} vs written {}", a, b);
    }

    let result = transcribe_file(&path, TranscriptionConfig::default()).unwrap();
    assert_contiguous(&result.segments, 1.0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_transcribe_missing_file() {
    let result = transcribe_file("/nonexistent/chords.wav", TranscriptionConfig::default());
    assert!(result.is_err());
}
