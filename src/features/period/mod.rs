//! Period estimation modules
//!
//! Convert an onset strength envelope into a tempo estimate using
//! FFT-accelerated autocorrelation with a log-normal tempo prior.

pub mod autocorrelation;

pub use autocorrelation::estimate_tempo;

/// Tempo estimate with confidence
#[derive(Debug, Clone)]
pub struct TempoEstimate {
    /// BPM estimate
    pub bpm: f32,

    /// Beat period in envelope frames
    pub period_frames: usize,

    /// Normalized autocorrelation at the chosen lag (0.0-1.0)
    pub confidence: f32,
}
