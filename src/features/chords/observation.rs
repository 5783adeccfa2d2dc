//! Observation model
//!
//! Converts beat-synchronous chroma rows into per-row probability
//! distributions over chord templates with an exponentiated similarity
//! kernel:
//!
//! `score[j] = base ^ clamp(dot(chroma, template[j]) * w[j], 0, cap)`
//!
//! where `w[j]` is the no-chord penalty for `N` and 1 otherwise. Each row is
//! then normalized to sum to one.

use super::templates::TemplateBank;
use crate::features::chroma::ChromaFrame;

/// Guard for the row-sum divisor
const EPSILON: f64 = 1e-10;

/// Parameters of the similarity kernel
#[derive(Debug, Clone, Copy)]
pub struct ObservationModel {
    /// Base of the exponential (1.6)
    pub base: f64,
    /// Upper clamp of the exponent (200)
    pub max_exponent: f64,
    /// Multiplier on the `N` dot product (0.6)
    pub no_chord_penalty: f64,
}

impl Default for ObservationModel {
    fn default() -> Self {
        Self {
            base: 1.6,
            max_exponent: 200.0,
            no_chord_penalty: 0.6,
        }
    }
}

impl ObservationModel {
    /// Score every chroma row against every template
    ///
    /// # Returns
    ///
    /// `rows.len()` probability rows of `bank.len()` entries each
    pub fn observation_matrix(&self, rows: &[ChromaFrame], bank: &TemplateBank) -> Vec<Vec<f64>> {
        let no_chord = bank.no_chord_index();

        let matrix: Vec<Vec<f64>> = rows
            .iter()
            .map(|chroma| {
                let mut scores: Vec<f64> = bank
                    .templates()
                    .iter()
                    .enumerate()
                    .map(|(j, template)| {
                        let mut sim: f64 = chroma
                            .iter()
                            .zip(template.vector.iter())
                            .map(|(&c, &t)| c as f64 * t as f64)
                            .sum();
                        if j == no_chord {
                            sim *= self.no_chord_penalty;
                        }
                        self.kernel(sim)
                    })
                    .collect();

                let total: f64 = scores.iter().sum::<f64>() + EPSILON;
                for s in scores.iter_mut() {
                    *s /= total;
                }
                scores
            })
            .collect();

        log::debug!(
            "Observation matrix: {} rows x {} templates",
            matrix.len(),
            bank.len()
        );

        matrix
    }

    /// `base ^ clamp(similarity, 0, max_exponent)`; NaN scores count as zero
    fn kernel(&self, similarity: f64) -> f64 {
        let exponent = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, self.max_exponent)
        };
        self.base.powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chroma::CHROMA_SIZE;

    fn bank() -> TemplateBank {
        TemplateBank::with_default_dictionary(1.1).unwrap()
    }

    #[test]
    fn test_rows_are_distributions() {
        let bank = bank();
        let mut chroma = [0.0f32; CHROMA_SIZE];
        chroma[3] = 1.0;
        chroma[12 + 3] = 1.0;
        chroma[12 + 7] = 0.8;
        chroma[12 + 10] = 0.9;

        let matrix = ObservationModel::default().observation_matrix(&[chroma, [0.0; CHROMA_SIZE]], &bank);
        assert_eq!(matrix.len(), 2);
        for row in &matrix {
            assert_eq!(row.len(), bank.len());
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
            assert!(row.iter().all(|&p| p > 0.0));
        }
    }

    #[test]
    fn test_c_major_scores_highest() {
        let bank = bank();
        // A-rooted rows: C = 3, E = 7, G = 10
        let mut chroma = [0.0f32; CHROMA_SIZE];
        chroma[3] = 1.0;
        chroma[12 + 3] = 1.0;
        chroma[12 + 7] = 1.0;
        chroma[12 + 10] = 1.0;

        let matrix = ObservationModel::default().observation_matrix(&[chroma], &bank);
        let best = (0..bank.len())
            .max_by(|&a, &b| matrix[0][a].partial_cmp(&matrix[0][b]).unwrap())
            .unwrap();
        assert_eq!(bank.name(best), Some("C"));
    }

    #[test]
    fn test_silent_row_is_uniform() {
        let bank = bank();
        let matrix = ObservationModel::default().observation_matrix(&[[0.0; CHROMA_SIZE]], &bank);
        let expected = 1.0 / bank.len() as f64;
        assert!(matrix[0].iter().all(|&p| (p - expected).abs() < 1e-9));
    }

    #[test]
    fn test_no_chord_penalty_applied() {
        let bank = bank();
        let flat = [1.0f32; CHROMA_SIZE];
        let strict = ObservationModel::default().observation_matrix(&[flat], &bank);
        let lenient = ObservationModel {
            no_chord_penalty: 1.0,
            ..Default::default()
        }
        .observation_matrix(&[flat], &bank);
        let n = bank.no_chord_index();
        assert!(strict[0][n] < lenient[0][n]);
    }

    #[test]
    fn test_exponent_clamped() {
        let model = ObservationModel::default();
        assert!(model.kernel(1e9).is_finite());
        assert_eq!(model.kernel(-5.0), 1.0);
        assert_eq!(model.kernel(f64::NAN), 1.0);
    }
}
