//! Constant-Q magnitude spectrogram
//!
//! Log-spaced frequency analysis matching musical pitch spacing. The chroma
//! extractor only depends on the [`ConstantQTransform`] trait; the default
//! implementation uses the spectral kernel method: every CQT bin is a
//! Hann-windowed complex exponential whose FFT is computed once, thresholded
//! to a sparse row, and applied to the FFT of each analysis frame.
//!
//! # Reference
//!
//! Brown, J. C., & Puckette, M. S. (1992). An efficient algorithm for the
//! calculation of a constant Q transform. *Journal of the Acoustical Society
//! of America*, 92(5), 2698-2701.

use crate::error::AnalysisError;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;

/// Kernel coefficients below this fraction of the per-bin peak are dropped
const DEFAULT_SPARSITY: f32 = 0.0054;

/// Capability: waveform → constant-Q magnitude matrix (bins × frames)
pub trait ConstantQTransform: Send + Sync {
    /// Compute the magnitude spectrogram
    ///
    /// # Arguments
    ///
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    /// * `hop_size` - Frame hop in samples; frame `t` is centered on sample `t * hop_size`
    /// * `min_frequency` - Center frequency of bin 0 in Hz
    /// * `n_bins` - Number of bins
    /// * `bins_per_octave` - Frequency resolution
    ///
    /// # Returns
    ///
    /// `n_bins` rows of `1 + samples.len() / hop_size` magnitudes
    fn magnitude(
        &self,
        samples: &[f32],
        sample_rate: u32,
        hop_size: usize,
        min_frequency: f32,
        n_bins: usize,
        bins_per_octave: usize,
    ) -> Result<Vec<Vec<f32>>, AnalysisError>;
}

/// Spectral-kernel constant-Q transform
#[derive(Debug, Clone)]
pub struct SpectralKernelCqt {
    /// Relative magnitude under which kernel coefficients are discarded
    pub sparsity: f32,
}

impl Default for SpectralKernelCqt {
    fn default() -> Self {
        Self {
            sparsity: DEFAULT_SPARSITY,
        }
    }
}

/// Sparse frequency-domain kernel, one row per CQT bin
struct SpectralKernel {
    fft_size: usize,
    rows: Vec<Vec<(usize, Complex<f32>)>>,
}

impl SpectralKernelCqt {
    fn build_kernel(
        &self,
        planner: &mut FftPlanner<f32>,
        sample_rate: u32,
        min_frequency: f32,
        n_bins: usize,
        bins_per_octave: usize,
    ) -> SpectralKernel {
        let sr = sample_rate as f32;
        let q = 1.0 / (2.0f32.powf(1.0 / bins_per_octave as f32) - 1.0);

        let frequencies: Vec<f32> = (0..n_bins)
            .map(|k| min_frequency * 2.0f32.powf(k as f32 / bins_per_octave as f32))
            .collect();
        let lengths: Vec<usize> = frequencies
            .iter()
            .map(|&f| ((q * sr / f).ceil() as usize).max(1))
            .collect();

        // Bin 0 has the longest window
        let fft_size = lengths[0].next_power_of_two();
        let fft = planner.plan_fft_forward(fft_size);
        let scale = 1.0 / fft_size as f32;

        let mut rows = Vec::with_capacity(n_bins);
        for (&freq, &len) in frequencies.iter().zip(lengths.iter()) {
            let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];
            let start = (fft_size - len) / 2;
            let half = len as f32 / 2.0;

            for n in 0..len {
                let window = 0.5 - 0.5 * (2.0 * PI * n as f32 / len as f32).cos();
                let phase = 2.0 * PI * freq * (n as f32 - half) / sr;
                buffer[start + n] = Complex::from_polar(window / len as f32, phase);
            }

            fft.process(&mut buffer);

            let peak = buffer.iter().map(|c| c.norm()).fold(0.0f32, f32::max);
            let threshold = peak * self.sparsity;
            let row: Vec<(usize, Complex<f32>)> = buffer
                .iter()
                .enumerate()
                .filter(|(_, c)| c.norm() >= threshold)
                .map(|(j, c)| (j, c.conj() * scale))
                .collect();
            rows.push(row);
        }

        log::debug!(
            "Built CQT kernel: {} bins, fft_size={}, {} nonzero coefficients",
            n_bins,
            fft_size,
            rows.iter().map(Vec::len).sum::<usize>()
        );

        SpectralKernel { fft_size, rows }
    }
}

impl ConstantQTransform for SpectralKernelCqt {
    fn magnitude(
        &self,
        samples: &[f32],
        sample_rate: u32,
        hop_size: usize,
        min_frequency: f32,
        n_bins: usize,
        bins_per_octave: usize,
    ) -> Result<Vec<Vec<f32>>, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Empty audio samples".to_string(),
            ));
        }
        if sample_rate == 0 || hop_size == 0 || n_bins == 0 || bins_per_octave == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid CQT parameters: sample_rate={}, hop={}, bins={}, bins_per_octave={}",
                sample_rate, hop_size, n_bins, bins_per_octave
            )));
        }
        if !(min_frequency > 0.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "CQT minimum frequency must be positive, got {}",
                min_frequency
            )));
        }

        let max_frequency =
            min_frequency * 2.0f32.powf((n_bins - 1) as f32 / bins_per_octave as f32);
        let nyquist = sample_rate as f32 / 2.0;
        if max_frequency >= nyquist {
            return Err(AnalysisError::InvalidInput(format!(
                "Highest CQT bin ({:.1} Hz) exceeds Nyquist ({:.1} Hz)",
                max_frequency, nyquist
            )));
        }

        let mut planner = FftPlanner::new();
        let kernel = self.build_kernel(
            &mut planner,
            sample_rate,
            min_frequency,
            n_bins,
            bins_per_octave,
        );
        let fft = planner.plan_fft_forward(kernel.fft_size);

        let n_frames = 1 + samples.len() / hop_size;
        let half = kernel.fft_size / 2;
        let mut output = vec![vec![0.0f32; n_frames]; n_bins];
        let mut frame = vec![Complex::new(0.0f32, 0.0); kernel.fft_size];

        for t in 0..n_frames {
            // Frame centered on t * hop, zero padded outside the signal
            let center = t * hop_size;
            for (n, slot) in frame.iter_mut().enumerate() {
                let idx = (center + n).checked_sub(half);
                let value = match idx {
                    Some(i) if i < samples.len() => samples[i],
                    _ => 0.0,
                };
                *slot = Complex::new(value, 0.0);
            }

            fft.process(&mut frame);

            for (k, row) in kernel.rows.iter().enumerate() {
                let mut acc = Complex::new(0.0f32, 0.0);
                for &(j, coef) in row {
                    acc += frame[j] * coef;
                }
                output[k][t] = acc.norm();
            }
        }

        log::debug!(
            "CQT: {} bins x {} frames from {:.1} Hz ({} bins/octave)",
            n_bins,
            n_frames,
            min_frequency,
            bins_per_octave
        );

        Ok(output)
    }
}
