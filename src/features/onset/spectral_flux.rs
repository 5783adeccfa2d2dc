//! Spectral flux onset strength
//!
//! Computes a per-frame onset strength envelope on the same centered frame
//! grid as the constant-Q transform (`1 + len / hop` frames), so beat frames
//! index chroma frames directly.
//!
//! Algorithm:
//! 1. Hann-windowed FFT per frame (frame `t` centered on sample `t * hop`)
//! 2. Log-compressed magnitude: `ln(1 + C * |X|)`
//! 3. Flux: `sum_k max(0, S[t][k] - S[t-1][k])`
//!
//! # Reference
//!
//! Bello, J. P., Daudet, L., Abdallah, S., Duxbury, C., Davies, M., & Sandler, M. B. (2005).
//! A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

/// Log compression gain applied to magnitudes
const LOG_COMPRESSION: f32 = 100.0;

/// Compute the spectral flux onset strength envelope
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `frame_size` - FFT size (typically 2048)
/// * `hop_size` - Hop between frame centers
///
/// # Returns
///
/// One non-negative value per frame; the first frame is always 0
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` or `hop_size` is 0
pub fn onset_strength_envelope(
    samples: &[f32],
    frame_size: usize,
    hop_size: usize,
) -> Result<Vec<f32>, AnalysisError> {
    if frame_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Frame size must be > 0".to_string(),
        ));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let n_frames = 1 + samples.len() / hop_size;
    let n_bins = frame_size / 2 + 1;
    let half = frame_size / 2;

    log::debug!(
        "Computing spectral flux envelope: {} samples, frame={}, hop={}, {} frames",
        samples.len(),
        frame_size,
        hop_size,
        n_frames
    );

    let window: Vec<f32> = (0..frame_size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / frame_size as f32).cos())
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_size];
    let mut previous = vec![0.0f32; n_bins];
    let mut current = vec![0.0f32; n_bins];
    let mut envelope = Vec::with_capacity(n_frames);

    for t in 0..n_frames {
        let center = t * hop_size;
        for (n, slot) in buffer.iter_mut().enumerate() {
            let value = match (center + n).checked_sub(half) {
                Some(i) if i < samples.len() => samples[i] * window[n],
                _ => 0.0,
            };
            *slot = Complex::new(value, 0.0);
        }

        fft.process(&mut buffer);

        for (k, value) in current.iter_mut().enumerate() {
            *value = (1.0 + LOG_COMPRESSION * buffer[k].norm()).ln();
        }

        let flux = if t == 0 {
            0.0
        } else {
            current
                .iter()
                .zip(previous.iter())
                .map(|(c, p)| (c - p).max(0.0))
                .sum()
        };
        envelope.push(flux);

        std::mem::swap(&mut previous, &mut current);
    }

    Ok(envelope)
}
