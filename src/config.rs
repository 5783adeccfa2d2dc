//! Configuration parameters for chord transcription

use crate::error::AnalysisError;

/// Which per-frame peak each chroma register is divided by
///
/// The bass half (rows 0-11) and treble half (rows 12-23) of the chroma frame
/// are scaled independently so that loudness differences between registers
/// do not dominate template matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterNormalization {
    /// Bass rows divided by the bass peak, treble rows by the treble peak
    OwnRegister,
    /// Bass rows divided by the treble peak, treble rows by the bass peak
    CrossRegister,
}

/// Transcription configuration parameters
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    // Framing
    /// Hop size in samples shared by the CQT, beat tracker and segment times (default: 2048)
    pub hop_size: usize,

    // Chroma extraction
    /// Constant-Q resolution (default: 36, i.e. 3 bins per semitone)
    pub bins_per_octave: usize,

    /// Lowest treble CQT frequency in Hz (default: C2 = 65.406 Hz)
    pub treble_min_frequency: f32,

    /// Number of octaves covered by the treble CQT (default: 4)
    pub treble_octaves: usize,

    /// Lowest bass CQT frequency in Hz (default: C1 = 32.703 Hz)
    pub bass_min_frequency: f32,

    /// Number of octaves covered by the bass CQT (default: 2)
    pub bass_octaves: usize,

    /// Moving-average window for spectral whitening, in CQT bins (default: 37)
    pub whitening_window: usize,

    /// Register normalization mode (default: OwnRegister)
    pub register_normalization: RegisterNormalization,

    // Beat grid
    /// Sub-beats per beat (default: 4)
    pub subdivisions: usize,

    /// Minimum tempo considered by the beat tracker (default: 60.0)
    pub min_bpm: f32,

    /// Maximum tempo considered by the beat tracker (default: 240.0)
    pub max_bpm: f32,

    // Observation model
    /// Base of the exponential similarity kernel (default: 1.6)
    pub similarity_base: f64,

    /// Upper clamp of the kernel exponent (default: 200.0)
    pub max_similarity_exponent: f64,

    /// Factor applied to the "no chord" dot product before exponentiation (default: 0.6)
    pub no_chord_penalty: f64,

    /// Divisor applied to the "no chord" template norm (default: 1.1)
    pub no_chord_lenience: f32,

    // HMM
    /// Base self-transition probability, must lie in (0, 1) (default: 0.85)
    pub self_transition_probability: f64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            hop_size: 2048,
            bins_per_octave: 36,
            treble_min_frequency: 65.406_39, // C2
            treble_octaves: 4,
            bass_min_frequency: 32.703_197, // C1
            bass_octaves: 2,
            whitening_window: 37,
            register_normalization: RegisterNormalization::OwnRegister,
            subdivisions: 4,
            min_bpm: 60.0,
            max_bpm: 240.0,
            similarity_base: 1.6,
            max_similarity_exponent: 200.0,
            no_chord_penalty: 0.6,
            no_chord_lenience: 1.1,
            self_transition_probability: 0.85,
        }
    }
}

impl TranscriptionConfig {
    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.hop_size == 0 {
            return Err(AnalysisError::InvalidInput("Hop size must be > 0".to_string()));
        }

        if self.bins_per_octave == 0 || self.bins_per_octave % 12 != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "bins_per_octave must be a positive multiple of 12, got {}",
                self.bins_per_octave
            )));
        }

        if self.treble_octaves == 0 || self.bass_octaves == 0 {
            return Err(AnalysisError::InvalidInput(
                "CQT octave counts must be > 0".to_string(),
            ));
        }

        if !(self.treble_min_frequency > 0.0) || !(self.bass_min_frequency > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "CQT minimum frequencies must be positive, got treble={} bass={}",
                self.treble_min_frequency, self.bass_min_frequency
            )));
        }

        if self.whitening_window == 0 {
            return Err(AnalysisError::InvalidInput(
                "Whitening window must be > 0".to_string(),
            ));
        }

        if self.subdivisions == 0 {
            return Err(AnalysisError::InvalidInput(
                "Sub-beat subdivisions must be > 0".to_string(),
            ));
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if !(self.self_transition_probability > 0.0 && self.self_transition_probability < 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Self-transition probability must lie in (0, 1), got {}",
                self.self_transition_probability
            )));
        }

        if !(self.similarity_base > 1.0) || !(self.max_similarity_exponent > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Similarity kernel needs base > 1 and a positive exponent cap, got base={} cap={}",
                self.similarity_base, self.max_similarity_exponent
            )));
        }

        if !(self.no_chord_penalty > 0.0) || !(self.no_chord_lenience > 0.0) {
            return Err(AnalysisError::InvalidInput(
                "No-chord penalty and lenience must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
