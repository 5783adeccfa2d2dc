//! End-to-end chord transcription pipeline
//!
//! Flow:
//!
//! ```text
//! samples → beat tracker → sub-beat grid ─┐
//!        → bass/treble chroma ────────────┴→ median sync → observation matrix
//!        → Viterbi path → segments
//! ```

use crate::analysis::metadata::TranscriptionMetadata;
use crate::analysis::result::ChordTranscription;
use crate::config::TranscriptionConfig;
use crate::error::AnalysisError;
use crate::features::beat_tracking::{BeatTrack, BeatTracker, DynamicBeatTracker};
use crate::features::chords::{build_segments, frames_to_time, ChordHmm, ObservationModel, TemplateBank};
use crate::features::chroma::extract_chroma;
use crate::features::chroma::sync::{subbeat_frames, sync_boundaries, sync_median};
use crate::features::cqt::{ConstantQTransform, SpectralKernelCqt};
use std::time::Instant;

/// Chord transcriber owning its template bank and signal collaborators
///
/// Immutable after construction, so one instance can serve concurrent calls.
///
/// # Example
///
/// ```no_run
/// use stratum_chords::{ChordTranscriber, TranscriptionConfig};
///
/// let transcriber = ChordTranscriber::new(TranscriptionConfig::default())?;
/// let samples = vec![0.0f32; 22050 * 5];
/// let result = transcriber.transcribe(&samples, 22050)?;
/// for segment in &result.segments {
///     println!("{:.2} - {:.2} : {}", segment.start, segment.end, segment.label);
/// }
/// # Ok::<(), stratum_chords::AnalysisError>(())
/// ```
pub struct ChordTranscriber {
    config: TranscriptionConfig,
    bank: TemplateBank,
    model: ObservationModel,
    cqt: Box<dyn ConstantQTransform>,
    beat_tracker: Box<dyn BeatTracker>,
}

impl ChordTranscriber {
    /// Create a transcriber with the default dictionary, CQT and beat tracker
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the configuration is invalid
    pub fn new(config: TranscriptionConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        let bank = TemplateBank::with_default_dictionary(config.no_chord_lenience)?;
        let model = ObservationModel {
            base: config.similarity_base,
            max_exponent: config.max_similarity_exponent,
            no_chord_penalty: config.no_chord_penalty,
        };
        let beat_tracker = DynamicBeatTracker::with_tempo_range(config.min_bpm, config.max_bpm);

        log::debug!(
            "Created chord transcriber: {} templates, hop={}, self-transition={}",
            bank.len(),
            config.hop_size,
            config.self_transition_probability
        );

        Ok(Self {
            config,
            bank,
            model,
            cqt: Box::new(SpectralKernelCqt::default()),
            beat_tracker: Box::new(beat_tracker),
        })
    }

    /// Replace the template bank (e.g. one built from a custom dictionary)
    pub fn with_templates(mut self, bank: TemplateBank) -> Self {
        self.bank = bank;
        self
    }

    /// Replace the constant-Q transform
    pub fn with_cqt(mut self, cqt: Box<dyn ConstantQTransform>) -> Self {
        self.cqt = cqt;
        self
    }

    /// Replace the beat tracker
    pub fn with_beat_tracker(mut self, beat_tracker: Box<dyn BeatTracker>) -> Self {
        self.beat_tracker = beat_tracker;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    /// Active template bank
    pub fn templates(&self) -> &TemplateBank {
        &self.bank
    }

    /// Transcribe mono audio using the configured beat tracker
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    ///
    /// Contiguous chord segments covering `[0, samples.len() / sample_rate]`,
    /// plus beat times and tempo
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for empty audio or a zero sample
    /// rate; collaborator failures propagate unchanged
    pub fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<ChordTranscription, AnalysisError> {
        validate_audio(samples, sample_rate)?;

        let start_time = Instant::now();
        let beats = self
            .beat_tracker
            .track(samples, sample_rate, self.config.hop_size)?;

        log::debug!(
            "Beat tracker: {} beats at {:.2} BPM",
            beats.beat_frames.len(),
            beats.tempo_bpm
        );

        self.run(samples, sample_rate, beats, start_time)
    }

    /// Transcribe mono audio against a known beat track
    ///
    /// # Errors
    ///
    /// Same as [`ChordTranscriber::transcribe`]
    pub fn transcribe_with_beats(
        &self,
        samples: &[f32],
        sample_rate: u32,
        beats: BeatTrack,
    ) -> Result<ChordTranscription, AnalysisError> {
        validate_audio(samples, sample_rate)?;
        self.run(samples, sample_rate, beats, Instant::now())
    }

    fn run(
        &self,
        samples: &[f32],
        sample_rate: u32,
        beats: BeatTrack,
        start_time: Instant,
    ) -> Result<ChordTranscription, AnalysisError> {
        let hop_size = self.config.hop_size;
        let duration = samples.len() as f32 / sample_rate as f32;

        let chroma = extract_chroma(samples, sample_rate, &self.config, self.cqt.as_ref())?;
        let n_frames = chroma.len();

        let grid = subbeat_frames(&beats.beat_frames, self.config.subdivisions);
        let boundaries = sync_boundaries(&grid, n_frames);
        let rows = sync_median(&chroma, &boundaries);

        log::debug!(
            "Synced {} chroma frames to {} sub-beat rows",
            n_frames,
            rows.len()
        );

        let observations = self.model.observation_matrix(&rows, &self.bank);
        let hmm = ChordHmm::new(
            self.config.self_transition_probability,
            self.bank.no_chord_index(),
        );
        let path = hmm.decode(&observations)?;

        let row_starts: Vec<f32> = boundaries[..path.len()]
            .iter()
            .map(|&frame| frames_to_time(frame, sample_rate, hop_size))
            .collect();
        let segments = build_segments(&path, &row_starts, &self.bank, duration)?;

        let beat_times = beats
            .beat_frames
            .iter()
            .map(|&frame| frames_to_time(frame, sample_rate, hop_size))
            .collect();

        let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;
        log::debug!(
            "Transcribed {:.2}s into {} segments in {:.1} ms",
            duration,
            segments.len(),
            processing_time_ms
        );

        Ok(ChordTranscription {
            segments,
            beats: beat_times,
            tempo_bpm: beats.tempo_bpm,
            metadata: TranscriptionMetadata {
                duration_seconds: duration,
                sample_rate,
                hop_size,
                frame_count: n_frames,
                subbeat_count: rows.len(),
                processing_time_ms,
                ..TranscriptionMetadata::default()
            },
        })
    }
}

fn validate_audio(samples: &[f32], sample_rate: u32) -> Result<(), AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput("Empty audio samples".to_string()));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate: 0".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::beat_tracking::FixedBeatGrid;

    #[test]
    fn test_rejects_empty_audio() {
        let transcriber = ChordTranscriber::new(TranscriptionConfig::default()).unwrap();
        assert!(matches!(
            transcriber.transcribe(&[], 22050),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            transcriber.transcribe(&[0.0; 1000], 0),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TranscriptionConfig {
            self_transition_probability: 1.5,
            ..Default::default()
        };
        assert!(ChordTranscriber::new(config).is_err());
    }

    #[test]
    fn test_silence_is_single_no_chord() {
        let transcriber = ChordTranscriber::new(TranscriptionConfig::default()).unwrap();
        let samples = vec![0.0f32; 22050 * 2];
        let result = transcriber.transcribe(&samples, 22050).unwrap();

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].label, "N");
        assert_eq!(result.segments[0].start, 0.0);
        assert!((result.segments[0].end - 2.0).abs() < 1e-6);
        assert!(result.beats.is_empty());
        assert_eq!(result.tempo_bpm, 0.0);
    }

    #[test]
    fn test_transcribe_with_known_beats() {
        let transcriber = ChordTranscriber::new(TranscriptionConfig::default()).unwrap();
        let beats = BeatTrack {
            tempo_bpm: 60.0,
            beat_frames: vec![0, 10, 20, 30],
        };
        let samples = vec![0.0f32; 22050 * 3];
        let result = transcriber
            .transcribe_with_beats(&samples, 22050, beats)
            .unwrap();

        assert_eq!(result.metadata.subbeat_count, 12);
        assert_eq!(result.beats.len(), 4);
        assert_eq!(result.segments.len(), 1);
        assert!((result.segments[0].end - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_metadata_counts() {
        let transcriber = ChordTranscriber::new(TranscriptionConfig::default())
            .unwrap()
            .with_beat_tracker(Box::new(FixedBeatGrid::new(vec![0.0, 2.0], 30.0)));
        let samples = vec![0.0f32; 44100];
        let result = transcriber.transcribe(&samples, 22050).unwrap();

        assert_eq!(result.metadata.frame_count, 1 + 44100 / 2048);
        assert_eq!(result.metadata.subbeat_count, 4);
        assert_eq!(result.metadata.hop_size, 2048);
        assert_eq!(result.tempo_bpm, 30.0);
        assert_eq!(result.beats.len(), 2);
    }
}
