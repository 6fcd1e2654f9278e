use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, SubsplitError};

use super::{JobStatus, Manifest, Playlist, ProducedArtifact, VideoJob};

/// Address of one job inside the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub playlist_id: String,
    pub index: usize,
}

/// Per-playlist status counts, for the `status` command.
#[derive(Debug, Clone)]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub counts: BTreeMap<JobStatus, usize>,
    pub total: usize,
}

/// Sole owner of the manifest for a process run.
///
/// Every mutation rewrites the whole document through a temp file that is renamed
/// over the target, so a crash leaves either the old or the new document on disk.
/// One process per manifest file; there is no locking.
pub struct ManifestStore {
    path: PathBuf,
    manifest: Manifest,
}

impl ManifestStore {
    /// Load the manifest at `path`, or start an empty one if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let manifest = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            debug!("No manifest at {}, starting empty", path.display());
            Manifest::default()
        };

        Ok(Self { path, manifest })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn job(&self, job: &JobRef) -> Result<&VideoJob> {
        self.manifest
            .playlists
            .get(&job.playlist_id)
            .and_then(|p| p.videos.get(job.index))
            .ok_or_else(|| missing_job(job))
    }

    /// Move a job to `status` and persist the whole document.
    ///
    /// `error` replaces the stored error (`None` clears it). `artifacts` may only
    /// accompany the move to `completed`.
    pub fn set_status(
        &mut self,
        job: &JobRef,
        status: JobStatus,
        error: Option<String>,
        artifacts: Option<Vec<ProducedArtifact>>,
    ) -> Result<()> {
        self.apply_status(job, status, error, artifacts)?;
        self.persist()?;
        debug!(
            "Job {}#{} is now {}",
            job.playlist_id, job.index, status
        );
        Ok(())
    }

    /// Reset interrupted jobs to `pending` with a single write.
    pub fn reset_interrupted(&mut self, jobs: &[JobRef]) -> Result<()> {
        if jobs.is_empty() {
            return Ok(());
        }
        for job in jobs {
            self.apply_status(job, JobStatus::Pending, None, None)?;
        }
        self.persist()
    }

    fn apply_status(
        &mut self,
        job: &JobRef,
        status: JobStatus,
        error: Option<String>,
        artifacts: Option<Vec<ProducedArtifact>>,
    ) -> Result<()> {
        if artifacts.is_some() && status != JobStatus::Completed {
            return Err(SubsplitError::StateConsistency(format!(
                "artifacts can only be recorded on completion, not {status}"
            )));
        }

        let video = self
            .manifest
            .playlists
            .get_mut(&job.playlist_id)
            .and_then(|p| p.videos.get_mut(job.index))
            .ok_or_else(|| missing_job(job))?;

        if !video.status.can_transition_to(status) {
            return Err(SubsplitError::StateConsistency(format!(
                "job {}#{} cannot move from {} to {}",
                job.playlist_id, job.index, video.status, status
            )));
        }

        video.status = status;
        video.error = error;
        if let Some(artifacts) = artifacts {
            video.processed_files = artifacts;
        }
        Ok(())
    }

    /// Append videos to a playlist, creating it if needed.
    pub fn add_videos(
        &mut self,
        playlist_id: &str,
        title: &str,
        videos: Vec<VideoJob>,
    ) -> Result<usize> {
        let playlist = self
            .manifest
            .playlists
            .entry(playlist_id.to_string())
            .or_insert_with(|| Playlist {
                title: title.to_string(),
                url: None,
                videos: Vec::new(),
            });
        playlist.videos.extend(videos);
        let total = playlist.videos.len();
        self.persist()?;
        Ok(total)
    }

    /// Store a whole remote playlist, replacing any previous entry with that id.
    pub fn put_playlist(&mut self, playlist_id: &str, playlist: Playlist) -> Result<()> {
        self.manifest
            .playlists
            .insert(playlist_id.to_string(), playlist);
        self.persist()
    }

    /// All jobs with `status`, playlist-declaration order then insertion order.
    pub fn jobs_with_status(&self, status: JobStatus) -> Vec<JobRef> {
        self.manifest
            .playlists
            .iter()
            .flat_map(|(id, playlist)| {
                playlist
                    .videos
                    .iter()
                    .enumerate()
                    .filter(move |(_, v)| v.status == status)
                    .map(move |(index, _)| JobRef {
                        playlist_id: id.clone(),
                        index,
                    })
            })
            .collect()
    }

    pub fn pending_jobs(&self) -> Vec<JobRef> {
        self.jobs_with_status(JobStatus::Pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_jobs().len()
    }

    pub fn status_summary(&self) -> Vec<PlaylistSummary> {
        self.manifest
            .playlists
            .iter()
            .map(|(id, playlist)| {
                let mut counts = BTreeMap::new();
                for video in &playlist.videos {
                    *counts.entry(video.status).or_insert(0) += 1;
                }
                PlaylistSummary {
                    id: id.clone(),
                    title: playlist.title.clone(),
                    counts,
                    total: playlist.videos.len(),
                }
            })
            .collect()
    }

    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.manifest)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| SubsplitError::Io(e.error))?;
        Ok(())
    }
}

fn missing_job(job: &JobRef) -> SubsplitError {
    SubsplitError::StateConsistency(format!(
        "no job #{} in playlist '{}'",
        job.index, job.playlist_id
    ))
}
