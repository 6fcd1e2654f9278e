//! On-disk layout under the workspace root.
//!
//! ```text
//! <base>/manifest.json
//! <base>/playlists/<id>/videos/      full downloads
//! <base>/playlists/<id>/processed/   clips and subtitle files
//! <base>/playlists/<id>/temp/        per-job scratch directories
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Workspace {
    base_dir: PathBuf,
}

impl Workspace {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join("manifest.json")
    }

    pub fn playlist_dir(&self, playlist_id: &str) -> PathBuf {
        self.base_dir.join("playlists").join(playlist_id)
    }

    pub fn videos_dir(&self, playlist_id: &str) -> PathBuf {
        self.playlist_dir(playlist_id).join("videos")
    }

    pub fn processed_dir(&self, playlist_id: &str) -> PathBuf {
        self.playlist_dir(playlist_id).join("processed")
    }

    pub fn scratch_root(&self, playlist_id: &str) -> PathBuf {
        self.playlist_dir(playlist_id).join("temp")
    }

    /// Fresh scratch directory for one job; removed when the guard is dropped.
    pub fn create_scratch(&self, playlist_id: &str) -> Result<TempDir> {
        let root = self.scratch_root(playlist_id);
        std::fs::create_dir_all(&root)?;
        Ok(tempfile::Builder::new().prefix("job-").tempdir_in(root)?)
    }

    /// Path relative to the workspace root when it lives inside it.
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
