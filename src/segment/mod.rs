//! Transcript geometry: where to cut, and what each cut's captions are.

pub mod planner;
pub mod sync;

pub use planner::{plan_split_ranges, PlannerConfig};
pub use sync::{synchronize, PartSubtitles};

use serde::{Deserialize, Serialize};

/// One timed utterance on the source timeline, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Copy of this segment moved along the timeline by `offset` seconds.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            text: self.text.clone(),
        }
    }
}

/// Window of the source timeline covered by one output part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRange {
    pub start: f64,
    pub end: f64,
}

impl SplitRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
