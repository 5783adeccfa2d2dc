//! Collapse a decoded state path into labeled time segments

use super::templates::TemplateBank;
use crate::analysis::result::ChordSegment;
use crate::error::AnalysisError;

/// Convert a frame index to seconds (`frame * hop / sample_rate`)
pub fn frames_to_time(frame: usize, sample_rate: u32, hop_size: usize) -> f32 {
    (frame as f64 * hop_size as f64 / sample_rate as f64) as f32
}

/// Build contiguous chord segments from a per-row state path
///
/// A new segment opens at the start time of every row whose state differs
/// from the previous row; the last segment closes at `duration`. Changes at or
/// past `duration` are folded into the running segment so every segment has
/// `start < end`.
///
/// # Arguments
///
/// * `path` - Decoded state per synced row
/// * `row_starts` - Start time (seconds) of each row, non-decreasing, first = 0
/// * `bank` - Template bank providing the labels
/// * `duration` - Total audio duration in seconds
///
/// # Errors
///
/// Returns `AnalysisError::ProcessingError` if lengths disagree or a state has no template
pub fn build_segments(
    path: &[usize],
    row_starts: &[f32],
    bank: &TemplateBank,
    duration: f32,
) -> Result<Vec<ChordSegment>, AnalysisError> {
    if path.len() != row_starts.len() {
        return Err(AnalysisError::ProcessingError(format!(
            "Path length {} does not match {} row times",
            path.len(),
            row_starts.len()
        )));
    }

    let label = |state: usize| -> Result<String, AnalysisError> {
        bank.name(state).map(str::to_string).ok_or_else(|| {
            AnalysisError::ProcessingError(format!("No template for state {}", state))
        })
    };

    let Some(&first) = path.first() else {
        return Ok(Vec::new());
    };

    let mut segments = Vec::new();
    let mut start = 0.0f32;
    let mut current = first;

    for (&state, &time) in path.iter().zip(row_starts.iter()).skip(1) {
        if state == current || time <= start || time >= duration {
            continue;
        }
        segments.push(ChordSegment {
            label: label(current)?,
            start,
            end: time,
        });
        start = time;
        current = state;
    }

    segments.push(ChordSegment {
        label: label(current)?,
        start,
        end: duration.max(start),
    });

    log::debug!("Built {} chord segments over {:.2}s", segments.len(), duration);

    Ok(segments)
}
