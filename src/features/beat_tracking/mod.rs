//! Beat tracking modules
//!
//! The chord decoder only needs beat frame indices and a tempo; any source
//! implementing [`BeatTracker`] can supply them:
//! - Dynamic-programming tracker over a spectral flux envelope
//! - Fixed, caller-supplied beat grid

pub mod dynamic_programming;

pub use dynamic_programming::DynamicBeatTracker;

use crate::error::AnalysisError;

/// Beat positions on the analysis frame grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatTrack {
    /// Tempo estimate in BPM (0.0 when unknown)
    pub tempo_bpm: f32,

    /// Beat frame indices, ascending (frame `t` is centered on sample `t * hop`)
    pub beat_frames: Vec<usize>,
}

/// Capability: waveform → tempo and beat frames
pub trait BeatTracker: Send + Sync {
    /// Track beats
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    /// * `hop_size` - Frame hop in samples
    fn track(
        &self,
        samples: &[f32],
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<BeatTrack, AnalysisError>;
}

/// Caller-supplied beat times
///
/// Useful when beats come from annotations or another tracker.
///
/// # Example
///
/// ```
/// use stratum_chords::features::beat_tracking::{BeatTracker, FixedBeatGrid};
///
/// let grid = FixedBeatGrid::new(vec![0.0, 2.0], 30.0);
/// let track = grid.track(&[0.0; 44100], 22050, 2048)?;
/// assert_eq!(track.beat_frames, vec![0, 21]);
/// # Ok::<(), stratum_chords::AnalysisError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FixedBeatGrid {
    /// Beat times in seconds
    pub beat_times: Vec<f32>,

    /// Tempo reported with the grid
    pub tempo_bpm: f32,
}

impl FixedBeatGrid {
    /// Create a grid from beat times in seconds
    pub fn new(beat_times: Vec<f32>, tempo_bpm: f32) -> Self {
        Self {
            beat_times,
            tempo_bpm,
        }
    }
}

impl BeatTracker for FixedBeatGrid {
    fn track(
        &self,
        _samples: &[f32],
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<BeatTrack, AnalysisError> {
        if sample_rate == 0 || hop_size == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid frame grid: sample_rate={}, hop={}",
                sample_rate, hop_size
            )));
        }
        if let Some(t) = self.beat_times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Beat time must be finite and non-negative, got {}",
                t
            )));
        }

        let mut beat_frames: Vec<usize> = self
            .beat_times
            .iter()
            .map(|&t| (t as f64 * sample_rate as f64 / hop_size as f64).floor() as usize)
            .collect();
        beat_frames.sort_unstable();

        Ok(BeatTrack {
            tempo_bpm: self.tempo_bpm,
            beat_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_grid_frames() {
        let grid = FixedBeatGrid::new(vec![1.0, 0.5, 0.0], 120.0);
        let track = grid.track(&[], 44100, 512).unwrap();
        assert_eq!(track.beat_frames, vec![0, 43, 86]);
        assert_eq!(track.tempo_bpm, 120.0);
    }

    #[test]
    fn test_fixed_grid_rejects_negative_times() {
        let grid = FixedBeatGrid::new(vec![-1.0], 120.0);
        assert!(grid.track(&[], 44100, 512).is_err());
    }
}
