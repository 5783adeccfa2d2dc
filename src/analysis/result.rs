//! Transcription result types

use super::metadata::TranscriptionMetadata;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// One labeled time span
///
/// Serializes as `{"label": "C", "start": 0.0, "end": 2.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSegment {
    /// Chord label (`"N"` for no chord)
    pub label: String,

    /// Start time in seconds
    pub start: f32,

    /// End time in seconds
    pub end: f32,
}

impl ChordSegment {
    /// Segment length in seconds
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// True for the "no chord" label
    pub fn is_no_chord(&self) -> bool {
        self.label == crate::features::chords::NO_CHORD_LABEL
    }
}

/// Complete transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordTranscription {
    /// Contiguous segments covering `[0, duration]`
    pub segments: Vec<ChordSegment>,

    /// Beat times in seconds
    pub beats: Vec<f32>,

    /// Tempo estimate in BPM (0.0 when no beats were found)
    pub tempo_bpm: f32,

    /// Run metadata
    pub metadata: TranscriptionMetadata,
}

impl ChordTranscription {
    /// Label active at `time` seconds, if inside the transcription
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_chords::{ChordSegment, ChordTranscription};
    /// use stratum_chords::analysis::metadata::TranscriptionMetadata;
    ///
    /// let result = ChordTranscription {
    ///     segments: vec![
    ///         ChordSegment { label: "N".into(), start: 0.0, end: 0.5 },
    ///         ChordSegment { label: "C".into(), start: 0.5, end: 2.0 },
    ///     ],
    ///     beats: vec![],
    ///     tempo_bpm: 0.0,
    ///     metadata: TranscriptionMetadata::default(),
    /// };
    /// assert_eq!(result.label_at(1.0), Some("C"));
    /// assert_eq!(result.label_at(3.0), None);
    /// ```
    pub fn label_at(&self, time: f32) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| time >= s.start && time < s.end)
            .map(|s| s.label.as_str())
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::SerializationError` if serialization fails
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
