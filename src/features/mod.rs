//! Feature extraction modules
//!
//! This module contains the signal-level stages of chord transcription:
//! - Constant-Q magnitude spectrogram
//! - Onset strength (spectral flux)
//! - Period estimation (tempo)
//! - Beat tracking
//! - Bass/treble chroma with sub-beat synchronization
//! - Chord templates, observation scoring and HMM decoding

pub mod beat_tracking;
pub mod chords;
pub mod chroma;
pub mod cqt;
pub mod onset;
pub mod period;
