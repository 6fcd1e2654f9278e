//! Persisted playlists and their video jobs.

pub mod store;

pub use store::{JobRef, ManifestStore, PlaylistSummary};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of parts a newly added video is split into unless told otherwise.
pub const DEFAULT_SPLITS: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declaration order is processing priority.
    #[serde(default)]
    pub playlists: IndexMap<String, Playlist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoJob>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoJob {
    pub url: String,
    pub title: String,
    #[serde(default = "default_splits")]
    pub splits: u32,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub processed_files: Vec<ProducedArtifact>,
}

fn default_splits() -> u32 {
    DEFAULT_SPLITS
}

impl VideoJob {
    pub fn new(url: impl Into<String>, title: impl Into<String>, splits: u32) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            splits,
            status: JobStatus::Pending,
            error: None,
            processed_files: Vec::new(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Allowed moves: pending → processing → completed | failed, and the
    /// crash-recovery reset processing → pending.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Pending)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One finished clip and its subtitle file, relative to the workspace root.
/// A clip with no speech in it has no subtitle file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducedArtifact {
    pub video: PathBuf,
    #[serde(default)]
    pub srt: Option<PathBuf>,
}
