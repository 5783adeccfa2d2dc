//! Dynamic-programming beat tracker
//!
//! Picks a beat sequence that lands on strong onsets while keeping
//! inter-beat intervals close to the global tempo period.
//!
//! # Algorithm
//!
//! 1. Spectral flux envelope at a fine hop, normalized by its standard deviation
//! 2. Global tempo from the autocorrelation of the envelope
//! 3. Local score: envelope smoothed by a Gaussian scaled to the period
//! 4. Cumulative score: `C[t] = L[t] + max_{τ} (C[t-τ] - α·ln²(τ/P))`
//!    over `τ ∈ [P/2, 2P]`, with backlinks
//! 5. Backtrack from the last strong cumulative peak; drop weak edge beats
//! 6. Convert beat frames onto the caller's hop grid
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use super::{BeatTrack, BeatTracker};
use crate::error::AnalysisError;
use crate::features::onset::onset_strength_envelope;
use crate::features::period::estimate_tempo;

const EPSILON: f32 = 1e-10;

/// Beat tracker combining autocorrelation tempo with dynamic programming
#[derive(Debug, Clone)]
pub struct DynamicBeatTracker {
    /// Minimum tempo in BPM
    pub min_bpm: f32,

    /// Maximum tempo in BPM
    pub max_bpm: f32,

    /// Penalty weight for deviating from the tempo period
    pub tightness: f32,

    /// FFT size of the onset envelope
    pub frame_size: usize,

    /// Hop of the onset envelope (finer than the chroma hop)
    pub onset_hop: usize,
}

impl Default for DynamicBeatTracker {
    fn default() -> Self {
        Self {
            min_bpm: 60.0,
            max_bpm: 240.0,
            tightness: 100.0,
            frame_size: 2048,
            onset_hop: 512,
        }
    }
}

impl DynamicBeatTracker {
    /// Tracker restricted to a tempo range
    pub fn with_tempo_range(min_bpm: f32, max_bpm: f32) -> Self {
        Self {
            min_bpm,
            max_bpm,
            ..Self::default()
        }
    }
}

impl BeatTracker for DynamicBeatTracker {
    fn track(
        &self,
        samples: &[f32],
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<BeatTrack, AnalysisError> {
        if sample_rate == 0 || hop_size == 0 || self.onset_hop == 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid beat tracking grid: sample_rate={}, hop={}, onset_hop={}",
                sample_rate, hop_size, self.onset_hop
            )));
        }

        let envelope = onset_strength_envelope(samples, self.frame_size, self.onset_hop)?;
        let Some(tempo) = estimate_tempo(
            &envelope,
            sample_rate,
            self.onset_hop,
            self.min_bpm,
            self.max_bpm,
        )?
        else {
            log::debug!("No tempo found, returning empty beat track");
            return Ok(BeatTrack::default());
        };

        let beats = track_beats(&envelope, tempo.period_frames as f32, self.tightness);

        let scale = self.onset_hop as f64 / hop_size as f64;
        let mut beat_frames: Vec<usize> = beats
            .iter()
            .map(|&b| (b as f64 * scale).round() as usize)
            .collect();
        beat_frames.dedup();

        log::debug!(
            "Tracked {} beats at {:.2} BPM (onset hop {}, output hop {})",
            beat_frames.len(),
            tempo.bpm,
            self.onset_hop,
            hop_size
        );

        Ok(BeatTrack {
            tempo_bpm: tempo.bpm,
            beat_frames,
        })
    }
}

/// Dynamic-programming beat search over an onset envelope
///
/// # Arguments
///
/// * `envelope` - Onset strength per frame
/// * `period` - Beat period in envelope frames
/// * `tightness` - Tempo deviation penalty
///
/// # Returns
///
/// Ascending beat frame indices on the envelope grid (empty for silence)
fn track_beats(envelope: &[f32], period: f32, tightness: f32) -> Vec<usize> {
    let n = envelope.len();
    if n < 2 || period < 1.0 {
        return Vec::new();
    }

    let mean = envelope.iter().sum::<f32>() / n as f32;
    let variance = envelope.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1) as f32;
    let std = variance.sqrt();
    if std <= EPSILON {
        return Vec::new();
    }

    let normalized: Vec<f32> = envelope.iter().map(|v| v / std).collect();
    let local = local_score(&normalized, period);

    // Predecessor offsets [-2P, -P/2] and their log-interval penalties
    let far = (2.0 * period).round() as usize;
    let near = (period / 2.0).round().max(1.0) as usize;
    let offsets: Vec<(usize, f32)> = (near..=far)
        .map(|lag| {
            let ratio = (lag as f32 / period).ln();
            (lag, -tightness * ratio * ratio)
        })
        .collect();

    let mut cumulative = vec![0.0f32; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];

    for t in 0..n {
        let mut best: Option<(usize, f32)> = None;
        for &(lag, penalty) in &offsets {
            let Some(prev) = t.checked_sub(lag) else {
                continue;
            };
            let score = cumulative[prev] + penalty;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((prev, score));
            }
        }

        match best {
            Some((prev, score)) if score > 0.0 => {
                cumulative[t] = local[t] + score;
                backlink[t] = Some(prev);
            }
            _ => cumulative[t] = local[t],
        }
    }

    let Some(last) = last_beat(&cumulative) else {
        return Vec::new();
    };

    let mut beats = vec![last];
    let mut cursor = last;
    while let Some(prev) = backlink[cursor] {
        beats.push(prev);
        cursor = prev;
    }
    beats.reverse();

    trim_weak_edges(&beats, &local)
}

/// Gaussian-smoothed onset strength, kernel width scaled to the period
fn local_score(envelope: &[f32], period: f32) -> Vec<f32> {
    let radius = period.round() as isize;
    let kernel: Vec<f32> = (-radius..=radius)
        .map(|k| {
            let x = k as f32 * 32.0 / period;
            (-0.5 * x * x).exp()
        })
        .collect();

    let n = envelope.len() as isize;
    (0..n)
        .map(|t| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, w)| {
                    let i = t + j as isize - radius;
                    (i >= 0 && i < n).then(|| w * envelope[i as usize])
                })
                .sum()
        })
        .collect()
}

/// Last local maximum of the cumulative score above half the median peak
fn last_beat(cumulative: &[f32]) -> Option<usize> {
    let n = cumulative.len();
    let peaks: Vec<usize> = (0..n)
        .filter(|&t| {
            let left = t == 0 || cumulative[t] > cumulative[t - 1];
            let right = t + 1 == n || cumulative[t] >= cumulative[t + 1];
            left && right
        })
        .collect();

    if peaks.is_empty() {
        return None;
    }

    let mut values: Vec<f32> = peaks.iter().map(|&t| cumulative[t]).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let median = values[values.len() / 2];
    let threshold = 0.5 * median;

    peaks.into_iter().rev().find(|&t| cumulative[t] >= threshold)
}

/// Remove leading and trailing beats whose local score is below half the RMS
fn trim_weak_edges(beats: &[usize], local: &[f32]) -> Vec<usize> {
    if beats.is_empty() {
        return Vec::new();
    }

    let rms = (beats.iter().map(|&b| local[b] * local[b]).sum::<f32>() / beats.len() as f32).sqrt();
    let threshold = 0.5 * rms;

    let start = beats.iter().position(|&b| local[b] >= threshold);
    let end = beats.iter().rposition(|&b| local[b] >= threshold);
    match (start, end) {
        (Some(s), Some(e)) => beats[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Short decaying noise-like clicks every `interval` samples
    fn click_track(len: usize, interval: usize) -> Vec<f32> {
        let mut samples = vec![0.0f32; len];
        let mut start = interval / 2;
        while start < len {
            for i in 0..256 {
                if start + i < len {
                    let decay = (-(i as f32) / 40.0).exp();
                    let sign = if (i * 7919) % 3 == 0 { -1.0 } else { 1.0 };
                    samples[start + i] = sign * decay * 0.8;
                }
            }
            start += interval;
        }
        samples
    }

    #[test]
    fn test_tracks_click_train() {
        // 22 envelope frames per beat at 22050 Hz / 512 hop = 117.45 BPM
        let interval = 22 * 512;
        let samples = click_track(22050 * 12, interval);

        let tracker = DynamicBeatTracker::default();
        let track = tracker.track(&samples, 22050, 512).unwrap();

        assert!(
            (track.tempo_bpm - 117.45).abs() < 3.0,
            "expected ~117 BPM, got {:.2}",
            track.tempo_bpm
        );
        assert!(track.beat_frames.len() >= 15, "got {:?}", track.beat_frames);

        let mut intervals: Vec<usize> = track
            .beat_frames
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect();
        intervals.sort_unstable();
        let median = intervals[intervals.len() / 2];
        assert!((21..=23).contains(&median), "median interval {}", median);
    }

    #[test]
    fn test_beats_land_on_output_grid() {
        let interval = 22 * 512;
        let samples = click_track(22050 * 10, interval);

        let tracker = DynamicBeatTracker::default();
        let track = tracker.track(&samples, 22050, 2048).unwrap();
        let n_frames = 1 + samples.len() / 2048;

        assert!(!track.beat_frames.is_empty());
        assert!(track.beat_frames.windows(2).all(|w| w[0] < w[1]));
        assert!(track.beat_frames.iter().all(|&b| b < n_frames));
    }

    #[test]
    fn test_silence_has_no_beats() {
        let tracker = DynamicBeatTracker::default();
        let track = tracker.track(&vec![0.0f32; 22050 * 4], 22050, 2048).unwrap();
        assert_eq!(track.tempo_bpm, 0.0);
        assert!(track.beat_frames.is_empty());
    }

    #[test]
    fn test_trim_weak_edges() {
        let local = vec![0.1, 0.0, 5.0, 0.0, 5.0, 0.0, 0.2];
        assert_eq!(trim_weak_edges(&[0, 2, 4, 6], &local), vec![2, 4]);
    }

    #[test]
    fn test_invalid_grid() {
        let tracker = DynamicBeatTracker::default();
        assert!(tracker.track(&[0.0; 100], 0, 512).is_err());
        assert!(tracker.track(&[0.0; 100], 22050, 0).is_err());
    }
}
