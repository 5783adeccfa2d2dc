//! Beat-synchronous chroma aggregation
//!
//! The HMM runs on a sub-beat time axis: every inter-beat interval is split
//! into equal parts, and chroma frames between consecutive grid boundaries are
//! reduced to their per-dimension median.

use super::extractor::{ChromaFrame, CHROMA_SIZE};

/// Subdivide each inter-beat interval into `subdivisions` frame indices
///
/// For beats `b_i`, `b_{i+1}` this yields
/// `b_i + (b_{i+1} - b_i) * k / subdivisions` for `k = 0..subdivisions`,
/// truncated to integers. The closing beat is left to the next interval.
///
/// # Example
///
/// ```
/// use stratum_chords::features::chroma::sync::subbeat_frames;
///
/// assert_eq!(subbeat_frames(&[0, 21], 4), vec![0, 5, 10, 15]);
/// ```
pub fn subbeat_frames(beat_frames: &[usize], subdivisions: usize) -> Vec<usize> {
    if subdivisions == 0 {
        return Vec::new();
    }

    let mut grid = Vec::with_capacity(beat_frames.len().saturating_sub(1) * subdivisions);
    for pair in beat_frames.windows(2) {
        let (start, end) = (pair[0] as f64, pair[1] as f64);
        for k in 0..subdivisions {
            let position = start + (end - start) * k as f64 / subdivisions as f64;
            grid.push(position.max(0.0) as usize);
        }
    }
    grid
}

/// Turn a sub-beat grid into synchronisation boundaries
///
/// The grid is clipped to `[0, n_frames]`, padded with `0` and `n_frames`,
/// sorted and deduplicated. Consecutive boundaries delimit one synced row, so
/// row `k` covers frames `boundaries[k]..boundaries[k + 1]`.
pub fn sync_boundaries(grid: &[usize], n_frames: usize) -> Vec<usize> {
    let mut boundaries: Vec<usize> = Vec::with_capacity(grid.len() + 2);
    boundaries.push(0);
    boundaries.extend(grid.iter().map(|&f| f.min(n_frames)));
    boundaries.push(n_frames);
    boundaries.sort_unstable();
    boundaries.dedup();
    boundaries
}

/// Median-aggregate chroma frames between consecutive boundaries
///
/// # Returns
///
/// `boundaries.len() - 1` synced frames (empty if fewer than two boundaries)
pub fn sync_median(frames: &[ChromaFrame], boundaries: &[usize]) -> Vec<ChromaFrame> {
    let mut synced = Vec::with_capacity(boundaries.len().saturating_sub(1));
    let mut scratch: Vec<f32> = Vec::new();

    for pair in boundaries.windows(2) {
        let start = pair[0].min(frames.len());
        let end = pair[1].min(frames.len());
        let slice = &frames[start..end];

        let mut row = [0.0f32; CHROMA_SIZE];
        if !slice.is_empty() {
            for (d, value) in row.iter_mut().enumerate() {
                scratch.clear();
                scratch.extend(slice.iter().map(|f| f[d]));
                *value = median(&mut scratch);
            }
        }
        synced.push(row);
    }

    log::debug!(
        "Synced {} chroma frames into {} sub-beat rows",
        frames.len(),
        synced.len()
    );

    synced
}

/// Median with the midpoint of the two central values for even lengths
fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subbeat_frames_excludes_closing_beat() {
        let grid = subbeat_frames(&[0, 8, 16], 4);
        assert_eq!(grid, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[test]
    fn test_subbeat_frames_needs_two_beats() {
        assert!(subbeat_frames(&[], 4).is_empty());
        assert!(subbeat_frames(&[12], 4).is_empty());
    }

    #[test]
    fn test_boundaries_padded_and_unique() {
        let boundaries = sync_boundaries(&[3, 3, 5, 40], 20);
        assert_eq!(boundaries, vec![0, 3, 5, 20]);

        let boundaries = sync_boundaries(&[], 7);
        assert_eq!(boundaries, vec![0, 7]);
    }

    #[test]
    fn test_boundaries_strictly_increasing() {
        let grid = subbeat_frames(&[2, 3, 3, 9, 30], 4);
        let boundaries = sync_boundaries(&grid, 25);
        assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*boundaries.last().unwrap(), 25);
    }

    #[test]
    fn test_sync_median() {
        let mut frames = vec![[0.0f32; CHROMA_SIZE]; 5];
        frames[0][0] = 1.0;
        frames[1][0] = 5.0;
        frames[2][0] = 3.0;
        frames[3][0] = 2.0;
        frames[4][0] = 4.0;

        let synced = sync_median(&frames, &[0, 3, 5]);
        assert_eq!(synced.len(), 2);
        assert!((synced[0][0] - 3.0).abs() < 1e-6);
        assert!((synced[1][0] - 3.0).abs() < 1e-6, "even count averages the middle pair");
    }
}
