//! Bass/treble chroma extraction
//!
//! Produces one 24-element frame per hop: rows 0-11 are bass pitch classes,
//! rows 12-23 treble pitch classes, both A-rooted (row 0 = A) to line up with
//! the chord dictionary layout.
//!
//! Pipeline per register:
//! 1. Constant-Q magnitudes (36 bins/octave; treble C2 + 4 octaves, bass C1 + 2 octaves)
//! 2. Spectral whitening (see [`super::whitening`])
//! 3. Fold bins to 12 C-rooted pitch classes: class = `(bin / bins_per_semitone) % 12`
//! 4. Rotate to A-rooted rows and divide by a per-frame register peak

use super::whitening::whiten;
use crate::config::{RegisterNormalization, TranscriptionConfig};
use crate::error::AnalysisError;
use crate::features::cqt::ConstantQTransform;

/// Number of values in a chroma frame (12 bass + 12 treble)
pub const CHROMA_SIZE: usize = 24;

/// One bass/treble chroma frame
pub type ChromaFrame = [f32; CHROMA_SIZE];

/// Guard for the per-frame peak divisor
const EPSILON: f32 = 1e-10;

/// Offset from A-rooted row index to C-rooted pitch class (A = 9)
const A_ROOT_OFFSET: usize = 9;

/// Extract bass/treble chroma frames from mono audio
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Transcription configuration (hop, CQT ranges, whitening window)
/// * `cqt` - Constant-Q transform implementation
///
/// # Returns
///
/// Time-major chroma frames, one per hop (`1 + samples.len() / hop_size`)
///
/// # Errors
///
/// Returns `AnalysisError` if the input is empty or the CQT fails
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    config: &TranscriptionConfig,
    cqt: &dyn ConstantQTransform,
) -> Result<Vec<ChromaFrame>, AnalysisError> {
    log::debug!(
        "Extracting bass/treble chroma: {} samples at {} Hz, hop={}",
        samples.len(),
        sample_rate,
        config.hop_size
    );

    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty audio samples".to_string(),
        ));
    }

    let bpo = config.bins_per_octave;

    let treble = cqt.magnitude(
        samples,
        sample_rate,
        config.hop_size,
        config.treble_min_frequency,
        bpo * config.treble_octaves,
        bpo,
    )?;
    let bass = cqt.magnitude(
        samples,
        sample_rate,
        config.hop_size,
        config.bass_min_frequency,
        bpo * config.bass_octaves,
        bpo,
    )?;

    let treble = whiten(&treble, config.whitening_window);
    let bass = whiten(&bass, config.whitening_window);

    let treble_classes = collapse_to_pitch_classes(&treble, bpo);
    let bass_classes = collapse_to_pitch_classes(&bass, bpo);

    let frames = combine_registers(
        &bass_classes,
        &treble_classes,
        config.register_normalization,
    )?;

    log::debug!("Extracted {} chroma frames", frames.len());

    Ok(frames)
}

/// Sum whitened CQT bins into 12 C-rooted pitch classes
///
/// Bin `b` belongs to class `(b / (bins_per_octave / 12)) % 12`.
///
/// # Returns
///
/// Frame-major rows of 12 class energies
pub fn collapse_to_pitch_classes(whitened: &[Vec<f32>], bins_per_octave: usize) -> Vec<[f32; 12]> {
    let n_frames = whitened.first().map_or(0, Vec::len);
    let bins_per_semitone = (bins_per_octave / 12).max(1);

    let mut classes = vec![[0.0f32; 12]; n_frames];
    for (b, row) in whitened.iter().enumerate() {
        let class = (b / bins_per_semitone) % 12;
        for (t, &value) in row.iter().enumerate() {
            classes[t][class] += value;
        }
    }
    classes
}

/// Rotate C-rooted register energies to A-rooted rows and normalize each frame
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` when the registers disagree on frame count
pub fn combine_registers(
    bass: &[[f32; 12]],
    treble: &[[f32; 12]],
    mode: RegisterNormalization,
) -> Result<Vec<ChromaFrame>, AnalysisError> {
    if bass.len() != treble.len() {
        return Err(AnalysisError::ProcessingError(format!(
            "Bass and treble CQT frame counts differ: {} vs {}",
            bass.len(),
            treble.len()
        )));
    }

    let frames = bass
        .iter()
        .zip(treble.iter())
        .map(|(b, t)| {
            let bass_peak = b.iter().copied().fold(0.0f32, f32::max) + EPSILON;
            let treble_peak = t.iter().copied().fold(0.0f32, f32::max) + EPSILON;
            let (bass_div, treble_div) = match mode {
                RegisterNormalization::OwnRegister => (bass_peak, treble_peak),
                RegisterNormalization::CrossRegister => (treble_peak, bass_peak),
            };

            let mut frame = [0.0f32; CHROMA_SIZE];
            for i in 0..12 {
                let class = (i + A_ROOT_OFFSET) % 12;
                frame[i] = b[class] / bass_div;
                frame[i + 12] = t[class] / treble_div;
            }
            frame
        })
        .collect();

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::cqt::SpectralKernelCqt;
    use std::f32::consts::PI;

    /// CQT stand-in returning a single lit bin in every frame
    struct LitBin {
        bin: usize,
        frames: usize,
    }

    impl ConstantQTransform for LitBin {
        fn magnitude(
            &self,
            _samples: &[f32],
            _sample_rate: u32,
            _hop_size: usize,
            _min_frequency: f32,
            n_bins: usize,
            _bins_per_octave: usize,
        ) -> Result<Vec<Vec<f32>>, AnalysisError> {
            let mut out = vec![vec![0.0f32; self.frames]; n_bins];
            if self.bin < n_bins {
                out[self.bin] = vec![1.0; self.frames];
            }
            Ok(out)
        }
    }

    #[test]
    fn test_collapse_bins_per_semitone() {
        let mut whitened = vec![vec![0.0f32; 1]; 72];
        whitened[0][0] = 1.0; // C
        whitened[2][0] = 1.0; // still C (third bin of the semitone)
        whitened[3][0] = 2.0; // C#
        whitened[36][0] = 4.0; // C an octave up
        let classes = collapse_to_pitch_classes(&whitened, 36);
        assert_eq!(classes.len(), 1);
        assert!((classes[0][0] - 6.0).abs() < 1e-6);
        assert!((classes[0][1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_rows_are_a_rooted() {
        let mut bass = [0.0f32; 12];
        let mut treble = [0.0f32; 12];
        bass[9] = 2.0; // A
        treble[0] = 4.0; // C
        let frames =
            combine_registers(&[bass], &[treble], RegisterNormalization::OwnRegister).unwrap();
        assert!((frames[0][0] - 1.0).abs() < 1e-6, "bass A lands on row 0");
        assert!((frames[0][12 + 3] - 1.0).abs() < 1e-6, "treble C lands on row 15");
    }

    #[test]
    fn test_cross_register_normalization() {
        let mut bass = [0.0f32; 12];
        let mut treble = [0.0f32; 12];
        bass[9] = 2.0;
        treble[9] = 4.0;
        let frames =
            combine_registers(&[bass], &[treble], RegisterNormalization::CrossRegister).unwrap();
        assert!((frames[0][0] - 0.5).abs() < 1e-6);
        assert!((frames[0][12] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_count_mismatch() {
        let result = combine_registers(
            &[[0.0; 12]; 2],
            &[[0.0; 12]; 3],
            RegisterNormalization::OwnRegister,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_with_stub_cqt() {
        // Bin 28 of a 3-bins/semitone CQT is class 9 (A) after whitening
        let cqt = LitBin { bin: 28, frames: 5 };
        let config = TranscriptionConfig::default();
        let frames = extract_chroma(&[0.0; 100], 22050, &config, &cqt).unwrap();
        assert_eq!(frames.len(), 5);
        for frame in &frames {
            assert!((frame[0] - 1.0).abs() < 1e-4, "bass A row should peak");
            assert!((frame[12] - 1.0).abs() < 1e-4, "treble A row should peak");
            assert!(frame.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_extract_a_tone() {
        let sample_rate = 22050;
        let samples: Vec<f32> = (0..sample_rate)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();
        let config = TranscriptionConfig::default();
        let frames =
            extract_chroma(&samples, sample_rate, &config, &SpectralKernelCqt::default()).unwrap();

        let mid = &frames[frames.len() / 2];
        let treble_peak = (12..24)
            .max_by(|&a, &b| mid[a].partial_cmp(&mid[b]).unwrap())
            .unwrap();
        assert_eq!(treble_peak, 12, "A4 should dominate the treble A row");
    }

    #[test]
    fn test_extract_silence_is_finite() {
        let config = TranscriptionConfig::default();
        let frames =
            extract_chroma(&vec![0.0; 8192], 22050, &config, &SpectralKernelCqt::default())
                .unwrap();
        assert!(frames.iter().flatten().all(|v| v.is_finite()));
    }
}
