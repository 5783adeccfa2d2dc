//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::AnalysisError;

/// Average interleaved multi-channel samples to mono
///
/// # Arguments
///
/// * `samples` - Interleaved samples (`[L0, R0, L1, R1, ...]` for stereo)
/// * `channels` - Number of interleaved channels
///
/// # Returns
///
/// One sample per frame: the mean across channels
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `channels` is 0 or does not divide
/// the sample count
pub fn downmix_interleaved(samples: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }
    if samples.len() % channels != 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "{} samples cannot be split into {} channels",
            samples.len(),
            channels
        )));
    }

    if channels == 1 {
        return Ok(samples.to_vec());
    }

    let scale = 1.0 / channels as f32;
    Ok(samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let mono = downmix_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2).unwrap();
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono = downmix_interleaved(&[0.1, 0.2], 1).unwrap();
        assert_eq!(mono, vec![0.1, 0.2]);
    }

    #[test]
    fn test_downmix_invalid() {
        assert!(downmix_interleaved(&[0.0; 3], 2).is_err());
        assert!(downmix_interleaved(&[0.0; 4], 0).is_err());
    }
}
