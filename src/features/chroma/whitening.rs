//! Spectral whitening of constant-Q magnitudes
//!
//! Flattens the spectral envelope of each frame so that chroma energy reflects
//! local peaks rather than overall timbre:
//!
//! 1. `mu` = centered moving average over frequency (edge bins replicated)
//! 2. `diff = max(x - mu, 0)`
//! 3. `sigma = sqrt(max(avg(x²) - mu², 1e-10))`
//! 4. `whitened = diff / (sigma + 1e-10)`

/// Variance floor and divisor guard
const EPSILON: f32 = 1e-10;

/// Whiten a bins × frames magnitude matrix along the frequency axis
///
/// # Arguments
///
/// * `spectrogram` - Magnitudes, one row per frequency bin
/// * `window` - Moving-average window in bins (37 for 3 bins/semitone)
///
/// # Returns
///
/// Whitened matrix with the same shape; all values are non-negative
pub fn whiten(spectrogram: &[Vec<f32>], window: usize) -> Vec<Vec<f32>> {
    let n_bins = spectrogram.len();
    if n_bins == 0 {
        return Vec::new();
    }
    let n_frames = spectrogram[0].len();
    let window = window.max(1);

    let mut output = vec![vec![0.0f32; n_frames]; n_bins];
    let mut column = vec![0.0f32; n_bins];
    let mut squared = vec![0.0f32; n_bins];

    for t in 0..n_frames {
        for b in 0..n_bins {
            column[b] = spectrogram[b][t];
            squared[b] = column[b] * column[b];
        }

        let mu = moving_average_nearest(&column, window);
        let sq_mu = moving_average_nearest(&squared, window);

        for b in 0..n_bins {
            let diff = (column[b] - mu[b]).max(0.0);
            let sigma = (sq_mu[b] - mu[b] * mu[b]).max(EPSILON).sqrt();
            output[b][t] = diff / (sigma + EPSILON);
        }
    }

    log::debug!("Whitened {} bins x {} frames (window={})", n_bins, n_frames, window);

    output
}

/// Centered moving average with edge replication
///
/// For even windows the extra tap goes to the left, so index `i` averages
/// `[i - window/2, i + window - 1 - window/2]`.
fn moving_average_nearest(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let left = (window / 2) as isize;
    let right = (window - 1) as isize - left;
    let last = (n - 1) as isize;

    (0..n as isize)
        .map(|i| {
            let sum: f64 = (i - left..=i + right)
                .map(|j| values[j.clamp(0, last) as usize] as f64)
                .sum();
            (sum / window as f64) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_constant() {
        let values = vec![2.0f32; 10];
        let avg = moving_average_nearest(&values, 5);
        assert!(avg.iter().all(|&v| (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn test_moving_average_replicates_edges() {
        let values = vec![1.0, 0.0, 0.0, 0.0, 0.0];
        let avg = moving_average_nearest(&values, 3);
        // index 0 averages [1 (replicated), 1, 0]
        assert!((avg[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!((avg[1] - 1.0 / 3.0).abs() < 1e-6);
        assert!(avg[3].abs() < 1e-6);
    }

    #[test]
    fn test_whiten_flat_spectrum_is_zero() {
        let spec = vec![vec![0.7f32; 4]; 40];
        let white = whiten(&spec, 37);
        assert!(white.iter().flatten().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn test_whiten_peak_survives() {
        let mut spec = vec![vec![0.01f32; 3]; 60];
        for t in 0..3 {
            spec[30][t] = 1.0;
        }
        let white = whiten(&spec, 37);
        for t in 0..3 {
            assert!(white[30][t] > 1.0, "peak should stand out, got {}", white[30][t]);
            assert_eq!(white[10][t], 0.0, "below-mean bins are rectified");
        }
    }

    #[test]
    fn test_whiten_silence_no_nan() {
        let spec = vec![vec![0.0f32; 5]; 72];
        let white = whiten(&spec, 37);
        assert!(white.iter().flatten().all(|v| v.is_finite() && *v == 0.0));
    }
}
