//! External media tools: fetching sources and cutting them up.

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::Ffmpeg;
pub use ytdlp::{is_partial_download, YtDlp};

use crate::error::{Result, SubsplitError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Downloads source media to local files.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the video at `url` into `out_dir` and return the local file.
    async fn fetch_video(&self, url: &str, out_dir: &Path) -> Result<PathBuf>;

    /// Download only the audio track, as mp3 at the given quality hint.
    async fn fetch_audio(&self, url: &str, out_dir: &Path, quality: &str) -> Result<PathBuf>;
}

/// Probing and stream-copy cutting. Nothing here re-encodes.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    async fn probe_duration(&self, input: &Path) -> Result<f64>;

    /// Copy `duration` seconds starting at `start` into `output`.
    async fn cut(&self, input: &Path, start: f64, duration: f64, output: &Path) -> Result<()>;

    /// Split audio into consecutive files of `chunk` length, in timeline order.
    async fn segment_audio(
        &self,
        input: &Path,
        chunk: Duration,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// Run a tool to completion, turning a spawn failure or non-zero exit into
/// `ExternalTool` with the tool's stderr.
pub(crate) async fn run_tool(tool: &'static str, cmd: &mut Command) -> Result<Output> {
    debug!("Running {}: {:?}", tool, cmd.as_std());

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SubsplitError::tool(tool, format!("could not start: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SubsplitError::tool(
            tool,
            format!("exit status {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(output)
}
