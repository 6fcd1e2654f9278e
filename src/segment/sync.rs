use crate::subtitle::SubtitleEntry;

use super::{SplitRange, TranscriptSegment};

/// Captions for one output part, timed relative to the part's own start.
#[derive(Debug, Clone)]
pub struct PartSubtitles {
    pub range: SplitRange,
    pub entries: Vec<SubtitleEntry>,
}

impl PartSubtitles {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Re-time the transcript onto each planned part.
///
/// `ranges` must be the exact ranges the video is cut with. A segment that crosses
/// a boundary lands, truncated, in every part it touches.
pub fn synchronize(segments: &[TranscriptSegment], ranges: &[SplitRange]) -> Vec<PartSubtitles> {
    ranges
        .iter()
        .map(|range| PartSubtitles {
            range: *range,
            entries: rebase(segments, range),
        })
        .collect()
}

fn rebase(segments: &[TranscriptSegment], range: &SplitRange) -> Vec<SubtitleEntry> {
    let part_length = range.duration();

    segments
        .iter()
        .filter(|s| s.start < range.end && s.end > range.start)
        .filter_map(|s| {
            let start = (s.start - range.start).max(0.0);
            let end = (s.end - range.start).min(part_length);
            (end > start).then(|| (start, end, s.text.trim().to_string()))
        })
        .enumerate()
        .map(|(i, (start, end, text))| SubtitleEntry {
            index: i + 1,
            start,
            end,
            text,
        })
        .collect()
}
