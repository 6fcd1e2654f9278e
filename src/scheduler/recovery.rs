use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::manifest::{JobStatus, ManifestStore};
use crate::media::is_partial_download;
use crate::workspace::Workspace;

/// Reset jobs a previous run left in `processing`.
///
/// A job only stays in `processing` when the process died mid-job, so every such
/// job gets its partial downloads and scratch space removed and goes back to
/// `pending` with no error. The manifest is written once, and only if something
/// was reset. Returns the number of jobs reset.
pub fn scrub_interrupted_jobs(store: &mut ManifestStore, workspace: &Workspace) -> Result<usize> {
    let interrupted = store.jobs_with_status(JobStatus::Processing);
    if interrupted.is_empty() {
        debug!("No interrupted jobs found");
        return Ok(0);
    }

    let mut cleaned = HashSet::new();
    for job in &interrupted {
        let title = store.job(job)?.title.clone();
        warn!(
            "Found interrupted job '{}' ({}#{}), resetting to pending",
            title, job.playlist_id, job.index
        );

        if cleaned.insert(job.playlist_id.clone()) {
            let removed = remove_partial_downloads(&workspace.videos_dir(&job.playlist_id));
            if removed > 0 {
                info!("Removed {} partial downloads for {}", removed, job.playlist_id);
            }
            remove_dir_best_effort(&workspace.scratch_root(&job.playlist_id));
        }
    }

    store.reset_interrupted(&interrupted)?;
    Ok(interrupted.len())
}

/// Delete incomplete yt-dlp files in `dir`. Missing directories are fine.
fn remove_partial_downloads(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for path in entries.filter_map(|e| e.ok().map(|e| e.path())) {
        if !path.is_file() || !is_partial_download(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed partial download {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    removed
}

fn remove_dir_best_effort(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(dir) {
        warn!("Could not remove scratch directory {}: {}", dir.display(), e);
    }
}
