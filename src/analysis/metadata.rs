//! Transcription metadata

use serde::{Deserialize, Serialize};

/// Facts about one transcription run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionMetadata {
    /// Audio duration in seconds (`samples / sample_rate`)
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Hop size in samples
    pub hop_size: usize,

    /// Number of chroma frames
    pub frame_count: usize,

    /// Number of synced sub-beat rows fed to the decoder
    pub subbeat_count: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,
}

impl Default for TranscriptionMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            hop_size: 0,
            frame_count: 0,
            subbeat_count: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
