use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SubsplitError};

use super::{run_tool, MediaToolkit};

/// FFmpeg/FFprobe wrapper. Every operation stream-copies.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl Ffmpeg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that both executables start.
    pub async fn check(&self) -> Result<()> {
        run_tool("ffmpeg", Command::new(&self.ffmpeg).arg("-version")).await?;
        run_tool("ffprobe", Command::new(&self.ffprobe).arg("-version")).await?;
        debug!("FFmpeg and FFprobe are available");
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for Ffmpeg {
    async fn probe_duration(&self, input: &Path) -> Result<f64> {
        if !input.exists() {
            return Err(SubsplitError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(input);
        let output = run_tool("ffprobe", &mut cmd).await?;

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{} lasts {:.2}s", input.display(), duration);
        Ok(duration)
    }

    async fn cut(&self, input: &Path, start: f64, duration: f64, output: &Path) -> Result<()> {
        if duration <= 0.0 {
            return Err(SubsplitError::InvalidInput(format!(
                "Cut at {start:.3}s has non-positive length {duration:.3}s"
            )));
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-ss"])
            .arg(format!("{start:.3}"))
            .arg("-i")
            .arg(input)
            .arg("-t")
            .arg(format!("{duration:.3}"))
            .args(["-c", "copy", "-avoid_negative_ts", "make_zero"])
            .arg(output);
        run_tool("ffmpeg", &mut cmd).await?;

        info!("Created: {}", output.display());
        Ok(())
    }

    async fn segment_audio(
        &self,
        input: &Path,
        chunk: Duration,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(out_dir).await?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-i"])
            .arg(input)
            .args(["-f", "segment", "-segment_time"])
            .arg(chunk.as_secs().to_string())
            .args(["-c", "copy"])
            .arg(out_dir.join("chunk_%03d.mp3"));
        run_tool("ffmpeg", &mut cmd).await?;

        let mut chunks: Vec<PathBuf> = std::fs::read_dir(out_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("chunk_") && n.ends_with(".mp3"))
            })
            .collect();
        chunks.sort();

        info!("Split audio into {} chunks", chunks.len());
        Ok(chunks)
    }
}

fn parse_duration(stdout: &str) -> Result<f64> {
    let trimmed = stdout.trim();
    let duration: f64 = trimmed.parse().map_err(|e| {
        SubsplitError::tool("ffprobe", format!("Failed to parse duration '{trimmed}': {e}"))
    })?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(SubsplitError::tool(
            "ffprobe",
            format!("Reported duration {duration} is not usable"),
        ));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1234.567000\n").unwrap(), 1234.567);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("0.000").is_err());
        assert!(parse_duration("").is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let result = Ffmpeg::new()
            .probe_duration(Path::new("/nonexistent/file.mp4"))
            .await;
        assert!(matches!(result, Err(SubsplitError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cut_rejects_empty_range() {
        let result = Ffmpeg::new()
            .cut(Path::new("in.mp4"), 10.0, 0.0, Path::new("out.mp4"))
            .await;
        assert!(matches!(result, Err(SubsplitError::InvalidInput(_))));
    }
}
