//! # Stratum Chords
//!
//! Chord transcription for audio: turns a mono waveform into a contiguous list
//! of labeled time segments (`C`, `Am7`, `D/F#`, `N` for no chord, ...).
//!
//! ## Features
//!
//! - **Bass/Treble Chroma**: 36 bins/octave constant-Q analysis with spectral whitening
//! - **Template Bank**: 18 chord shapes × 12 roots plus "no chord", bass-aware
//! - **Beat-Synchronous Decoding**: median chroma per sub-beat, HMM Viterbi with a
//!   self-transition bias that favors changes on strong beats
//! - **Pluggable Collaborators**: swap the constant-Q transform or beat tracker via traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_chords::{transcribe_audio, TranscriptionConfig};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let result = transcribe_audio(&samples, sample_rate, TranscriptionConfig::default())?;
//!
//! for segment in &result.segments {
//!     println!("{:.2} - {:.2} : {}", segment.start, segment.end, segment.label);
//! }
//! # Ok::<(), stratum_chords::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio Input → Beat Tracking → Chroma → Sub-beat Sync → Template Scoring → Viterbi → Segments
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod transcriber;

// Re-export main types
pub use analysis::metadata::TranscriptionMetadata;
pub use analysis::result::{ChordSegment, ChordTranscription};
pub use config::{RegisterNormalization, TranscriptionConfig};
pub use error::AnalysisError;
pub use features::beat_tracking::{BeatTrack, BeatTracker, DynamicBeatTracker, FixedBeatGrid};
pub use features::chords::TemplateBank;
pub use features::cqt::{ConstantQTransform, SpectralKernelCqt};
pub use transcriber::ChordTranscriber;

/// Main transcription function
///
/// Builds a [`ChordTranscriber`] with the default collaborators and runs it
/// once. Construct a transcriber directly to reuse it across calls.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 22050, 44100 or 48000)
/// * `config` - Transcription configuration parameters
///
/// # Returns
///
/// `ChordTranscription` with segments, beat times, tempo and metadata
///
/// # Errors
///
/// Returns `AnalysisError` if the configuration or input is invalid
///
/// # Example
///
/// ```no_run
/// use stratum_chords::{transcribe_audio, TranscriptionConfig};
///
/// let samples = vec![0.0f32; 44100 * 10]; // 10 seconds of silence
/// let result = transcribe_audio(&samples, 44100, TranscriptionConfig::default())?;
/// assert_eq!(result.segments[0].label, "N");
/// # Ok::<(), stratum_chords::AnalysisError>(())
/// ```
pub fn transcribe_audio(
    samples: &[f32],
    sample_rate: u32,
    config: TranscriptionConfig,
) -> Result<ChordTranscription, AnalysisError> {
    ChordTranscriber::new(config)?.transcribe(samples, sample_rate)
}

/// Decode an audio file and transcribe it
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be decoded, or any
/// error from [`transcribe_audio`]
pub fn transcribe_file<P: AsRef<std::path::Path>>(
    path: P,
    config: TranscriptionConfig,
) -> Result<ChordTranscription, AnalysisError> {
    let (samples, sample_rate) = io::decode_audio(path)?;
    transcribe_audio(&samples, sample_rate, config)
}
