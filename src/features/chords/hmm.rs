//! HMM Viterbi chord decoder
//!
//! States are template indices; observations are the per-row distributions
//! from the observation model. The transition model is metrical: the
//! probability of staying on the same chord drops on beat boundaries and drops
//! further on strong-beat / half-bar boundaries of the sub-beat grid.
//!
//! | sub-beat `t`               | self-transition |
//! |----------------------------|-----------------|
//! | `t % 16 == 0` or `== 8`    | `p * 0.8`       |
//! | other `t % 4 == 0`         | `p * 0.9`       |
//! | otherwise                  | `p`             |
//!
//! The remaining mass `1 - p_self` is spread evenly over the other states.
//! Trellis rows are renormalized at every step to avoid underflow.

use crate::error::AnalysisError;

/// Guard for the trellis row-sum divisor
const EPSILON: f64 = 1e-10;

/// Self-transition multiplier on strong-beat / half-bar sub-beats
const STRONG_BEAT_FACTOR: f64 = 0.8;

/// Self-transition multiplier on other beat sub-beats
const BEAT_FACTOR: f64 = 0.9;

/// Viterbi decoder with a metrical self-transition bias
#[derive(Debug, Clone)]
pub struct ChordHmm {
    /// Base self-transition probability in (0, 1)
    pub self_transition_probability: f64,

    /// State that receives all initial probability mass
    pub no_chord_index: usize,
}

impl ChordHmm {
    /// Create a decoder
    pub fn new(self_transition_probability: f64, no_chord_index: usize) -> Self {
        Self {
            self_transition_probability,
            no_chord_index,
        }
    }

    /// Self-transition probability at sub-beat `t`
    pub fn self_transition_at(&self, t: usize) -> f64 {
        let p = self.self_transition_probability;
        match t % 16 {
            0 | 8 => p * STRONG_BEAT_FACTOR,
            m if m % 4 == 0 => p * BEAT_FACTOR,
            _ => p,
        }
    }

    /// Probability of moving to one specific other state at sub-beat `t`
    pub fn switch_probability_at(&self, t: usize, n_states: usize) -> f64 {
        if n_states < 2 {
            return 0.0;
        }
        (1.0 - self.self_transition_at(t)) / (n_states - 1) as f64
    }

    /// Decode the most likely state path
    ///
    /// # Arguments
    ///
    /// * `observations` - One probability row per sub-beat, all of equal length
    ///
    /// # Returns
    ///
    /// One state index per row (empty for empty input)
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if rows are ragged, there are fewer
    /// than two states, the no-chord index is out of range, or the base
    /// probability is outside (0, 1).
    pub fn decode(&self, observations: &[Vec<f64>]) -> Result<Vec<usize>, AnalysisError> {
        let p = self.self_transition_probability;
        if !(p > 0.0 && p < 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "Self-transition probability must lie in (0, 1), got {}",
                p
            )));
        }

        let n_rows = observations.len();
        if n_rows == 0 {
            return Ok(Vec::new());
        }

        let n_states = observations[0].len();
        if n_states < 2 {
            return Err(AnalysisError::InvalidInput(format!(
                "HMM needs at least 2 states, got {}",
                n_states
            )));
        }
        if self.no_chord_index >= n_states {
            return Err(AnalysisError::InvalidInput(format!(
                "No-chord state {} out of range for {} states",
                self.no_chord_index, n_states
            )));
        }
        if let Some(t) = observations.iter().position(|row| row.len() != n_states) {
            return Err(AnalysisError::InvalidInput(format!(
                "Observation row {} has {} states, expected {}",
                t,
                observations[t].len(),
                n_states
            )));
        }

        log::debug!(
            "Viterbi decoding: {} sub-beats x {} states (p_self={:.3})",
            n_rows,
            n_states,
            p
        );

        let mut delta = vec![vec![0.0f64; n_states]; n_rows];
        let mut psi = vec![vec![0usize; n_states]; n_rows];

        // Initial distribution: all mass on N, tempered by the first observation
        let first = sanitize(&observations[0]);
        delta[0][self.no_chord_index] = first[self.no_chord_index];
        normalize(&mut delta[0]);

        for t in 1..n_rows {
            let obs = sanitize(&observations[t]);
            let stay = self.self_transition_at(t);
            let switch = self.switch_probability_at(t, n_states);

            let (prev, current) = delta.split_at_mut(t);
            let prev = &prev[t - 1];
            let current = &mut current[0];

            for j in 0..n_states {
                let mut best_state = 0;
                let mut best_score = f64::NEG_INFINITY;
                for (i, &d) in prev.iter().enumerate() {
                    let score = if i == j { d * stay } else { d * switch };
                    if score > best_score {
                        best_score = score;
                        best_state = i;
                    }
                }
                psi[t][j] = best_state;
                current[j] = best_score * obs[j];
            }
            normalize(current);
        }

        let mut path = vec![0usize; n_rows];
        path[n_rows - 1] = argmax(&delta[n_rows - 1]);
        for t in (0..n_rows - 1).rev() {
            path[t] = psi[t + 1][path[t + 1]];
        }

        Ok(path)
    }
}

/// Replace an all-zero or non-finite observation row with a uniform row
fn sanitize(row: &[f64]) -> Vec<f64> {
    let total: f64 = row.iter().sum();
    if total > 0.0 && total.is_finite() && row.iter().all(|v| v.is_finite() && *v >= 0.0) {
        row.to_vec()
    } else {
        vec![1.0 / row.len() as f64; row.len()]
    }
}

/// Divide a row by its sum (plus epsilon)
fn normalize(row: &mut [f64]) {
    let total: f64 = row.iter().sum::<f64>() + EPSILON;
    for v in row.iter_mut() {
        *v /= total;
    }
}

/// Index of the first maximum
fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}
