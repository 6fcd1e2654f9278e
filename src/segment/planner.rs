use tracing::debug;

use crate::error::{Result, SubsplitError};

use super::{SplitRange, TranscriptSegment};

/// Tuning for sentence-aware split planning. All values are seconds.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// How far adjacent parts extend into each other across a boundary.
    pub overlap: f64,
    /// Distance around each naive boundary searched for a sentence end.
    pub search_window: f64,
    /// Characters that close a sentence.
    pub sentence_terminals: Vec<char>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            overlap: 15.0,
            search_window: 120.0,
            sentence_terminals: vec!['。', '！', '？'],
        }
    }
}

impl PlannerConfig {
    fn ends_sentence(&self, text: &str) -> bool {
        text.trim_end()
            .chars()
            .last()
            .is_some_and(|c| self.sentence_terminals.contains(&c))
    }
}

/// Plan `parts` overlapping ranges over `[0, duration]`.
///
/// Each of the `parts - 1` boundaries starts at the even split `k * duration / parts`
/// and moves to the closest sentence end within the search window, when there is one.
/// Part `i` then reaches `overlap` seconds past its boundaries on both sides.
pub fn plan_split_ranges(
    segments: &[TranscriptSegment],
    duration: f64,
    parts: u32,
    config: &PlannerConfig,
) -> Result<Vec<SplitRange>> {
    if parts < 1 {
        return Err(SubsplitError::Config(
            "Split count must be at least 1".to_string(),
        ));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(SubsplitError::InvalidInput(format!(
            "Media duration must be positive, got {duration}"
        )));
    }

    let boundaries: Vec<f64> = (1..parts)
        .map(|k| {
            let target = k as f64 * duration / parts as f64;
            find_sentence_boundary(segments, target, config).unwrap_or_else(|| {
                debug!("No sentence end near {:.1}s, cutting at the even split", target);
                target
            })
        })
        .collect();

    Ok(build_ranges(&boundaries, duration, config.overlap))
}

/// Closest sentence-ending segment end to `target`; earlier segments win ties.
fn find_sentence_boundary(
    segments: &[TranscriptSegment],
    target: f64,
    config: &PlannerConfig,
) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;

    for segment in segments {
        let distance = (segment.end - target).abs();
        if distance > config.search_window || !config.ends_sentence(&segment.text) {
            continue;
        }
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((segment.end, distance));
        }
    }

    if let Some((end, _)) = best {
        debug!("Boundary near {:.1}s moved to sentence end at {:.1}s", target, end);
    }
    best.map(|(end, _)| end)
}

fn build_ranges(boundaries: &[f64], duration: f64, overlap: f64) -> Vec<SplitRange> {
    let clamp = |t: f64| t.clamp(0.0, duration);
    let parts = boundaries.len() + 1;

    (0..parts)
        .map(|i| {
            let start = if i == 0 { 0.0 } else { boundaries[i - 1] - overlap };
            let end = if i == parts - 1 {
                duration
            } else {
                boundaries[i] + overlap
            };
            SplitRange {
                start: clamp(start),
                end: clamp(end),
            }
        })
        .collect()
}
