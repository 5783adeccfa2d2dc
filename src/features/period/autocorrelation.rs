//! Autocorrelation-based tempo estimation
//!
//! Finds the dominant periodicity of an onset strength envelope.
//!
//! # Algorithm
//!
//! 1. Remove the envelope mean
//! 2. Compute autocorrelation using FFT acceleration: `ACF = IFFT(|FFT(signal)|²)`
//! 3. Weight each lag by a log-normal tempo prior centered at 120 BPM
//!    (one octave standard deviation)
//! 4. Pick the best weighted lag within the BPM range and convert:
//!    `BPM = (60 * sample_rate) / (lag * hop_size)`
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::TempoEstimate;
use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const EPSILON: f32 = 1e-10;

/// Center of the tempo prior in BPM
const PRIOR_CENTER_BPM: f32 = 120.0;

/// Standard deviation of the tempo prior in octaves
const PRIOR_OCTAVES: f32 = 1.0;

/// Estimate tempo from an onset strength envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength, one value per frame
/// * `sample_rate` - Sample rate in Hz
/// * `hop_size` - Samples per envelope frame
/// * `min_bpm` - Minimum BPM to consider
/// * `max_bpm` - Maximum BPM to consider
///
/// # Returns
///
/// Tempo estimate, or `None` when the envelope is too short or has no
/// periodic structure (e.g. silence)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate/hop or an
/// invalid BPM range
pub fn estimate_tempo(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<Option<TempoEstimate>, AnalysisError> {
    log::debug!(
        "Estimating tempo from autocorrelation: {} frames, {} Hz, hop={}, range=[{:.1}, {:.1}] BPM",
        envelope.len(),
        sample_rate,
        hop_size,
        min_bpm,
        max_bpm
    );

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid sample rate: 0".to_string(),
        ));
    }

    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Invalid hop size: 0".to_string(),
        ));
    }

    if min_bpm <= 0.0 || max_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(AnalysisError::InvalidInput(format!(
            "Invalid BPM range: [{:.1}, {:.1}]",
            min_bpm, max_bpm
        )));
    }

    let frame_rate = sample_rate as f32 / hop_size as f32;
    let lag_min = ((60.0 * frame_rate) / max_bpm).ceil().max(1.0) as usize;
    let lag_max = ((60.0 * frame_rate) / min_bpm).floor() as usize;

    if lag_max >= envelope.len() || lag_min > lag_max {
        log::warn!(
            "Envelope too short for tempo estimation: {} frames, lags [{}, {}]",
            envelope.len(),
            lag_min,
            lag_max
        );
        return Ok(None);
    }

    let mean = envelope.iter().sum::<f32>() / envelope.len() as f32;
    let centered: Vec<f32> = envelope.iter().map(|&v| v - mean).collect();
    let acf = compute_autocorrelation_fft(&centered);

    if acf[0] <= EPSILON {
        log::debug!("Flat onset envelope, no tempo");
        return Ok(None);
    }

    let mut best: Option<(usize, f32)> = None;
    for lag in lag_min..=lag_max {
        let bpm = 60.0 * frame_rate / lag as f32;
        let octaves = (bpm / PRIOR_CENTER_BPM).log2() / PRIOR_OCTAVES;
        let weight = (-0.5 * octaves * octaves).exp();
        let score = acf[lag].max(0.0) * weight;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((lag, score));
        }
    }

    let Some((lag, score)) = best else {
        return Ok(None);
    };
    if score <= EPSILON {
        return Ok(None);
    }

    let bpm = 60.0 * frame_rate / lag as f32;
    let confidence = (acf[lag] / acf[0]).clamp(0.0, 1.0);

    log::debug!(
        "Autocorrelation tempo: {:.2} BPM (lag={}, confidence={:.3})",
        bpm,
        lag,
        confidence
    );

    Ok(Some(TempoEstimate {
        bpm,
        period_frames: lag,
        confidence,
    }))
}

/// Compute autocorrelation using FFT acceleration
///
/// Uses the identity: ACF = IFFT(|FFT(signal)|²), zero-padded to avoid
/// circular wrap-around.
///
/// # Returns
///
/// Autocorrelation function (same length as input)
fn compute_autocorrelation_fft(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let fft_size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    for x in &mut buffer {
        *x = *x * x.conj();
    }

    let ifft = planner.plan_fft_inverse(fft_size);
    ifft.process(&mut buffer);

    let scale = 1.0 / (fft_size as f32);
    buffer[..n].iter().map(|x| x.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse train with one pulse every `period` frames
    fn pulse_train(n: usize, period: usize) -> Vec<f32> {
        (0..n).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_autocorrelation_peak_at_period() {
        let acf = compute_autocorrelation_fft(&pulse_train(200, 10));
        assert!(acf[10] > acf[9] && acf[10] > acf[11]);
        assert!((acf[0] - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_estimate_tempo_from_pulses() {
        // 22050 Hz / 512 hop = 43.07 frames/s; a pulse every 21 frames = 123 BPM
        let env = pulse_train(43 * 30, 21);

        let tempo = estimate_tempo(&env, 22050, 512, 60.0, 240.0)
            .unwrap()
            .expect("tempo expected");
        assert_eq!(tempo.period_frames, 21);
        assert!(
            (tempo.bpm - 123.0).abs() < 1.0,
            "expected ~123 BPM, got {:.2}",
            tempo.bpm
        );
    }

    #[test]
    fn test_silence_has_no_tempo() {
        let env = vec![0.0f32; 2000];
        assert!(estimate_tempo(&env, 44100, 512, 60.0, 240.0).unwrap().is_none());
    }

    #[test]
    fn test_short_envelope_has_no_tempo() {
        let env = pulse_train(10, 2);
        assert!(estimate_tempo(&env, 44100, 2048, 60.0, 240.0).unwrap().is_none());
    }

    #[test]
    fn test_invalid_parameters() {
        let env = pulse_train(100, 10);
        assert!(estimate_tempo(&env, 0, 512, 60.0, 240.0).is_err());
        assert!(estimate_tempo(&env, 44100, 0, 60.0, 240.0).is_err());
        assert!(estimate_tempo(&env, 44100, 512, 180.0, 60.0).is_err());
    }
}
