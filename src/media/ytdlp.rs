use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Result, SubsplitError};

use super::{run_tool, MediaFetcher};

const TOOL: &str = "yt-dlp";

/// Low-resolution video with the best audio: the clips are for listening practice.
const VIDEO_FORMAT: &str = "worst[height<=480]+bestaudio/worst";

/// Print the final file path, even when the file was already downloaded.
const PRINT_FINAL_PATH: [&str; 3] = ["--no-simulate", "--print", "after_move:filepath"];

/// yt-dlp command-line wrapper.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            binary: TOOL.to_string(),
        }
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable instead of `yt-dlp` from PATH.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    /// Title of a single video, or a fallback derived from the URL.
    pub async fn fetch_title(&self, url: &str) -> String {
        let mut cmd = self.command();
        cmd.args(["--print", "title", url]);

        match run_tool(TOOL, &mut cmd).await {
            Ok(output) => {
                let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if title.is_empty() {
                    fallback_title(url)
                } else {
                    title
                }
            }
            Err(e) => {
                warn!("Could not fetch title for {}: {}", url, e);
                fallback_title(url)
            }
        }
    }

    /// `(url, title)` for every entry of a remote playlist.
    pub async fn list_playlist(&self, playlist_url: &str) -> Result<Vec<(String, String)>> {
        info!("Fetching playlist entries from {}", playlist_url);

        let mut cmd = self.command();
        cmd.args([
            "--flat-playlist",
            "--print",
            "url",
            "--print",
            "title",
            playlist_url,
        ]);
        let output = run_tool(TOOL, &mut cmd).await?;

        Ok(parse_playlist_listing(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn fetch_video(&self, url: &str, out_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(out_dir).await?;
        info!("Downloading video: {}", url);

        let mut cmd = self.command();
        cmd.args(["--format", VIDEO_FORMAT, "--merge-output-format", "mp4", "--output"])
            .arg(out_dir.join("%(title)s.%(ext)s"))
            .args(["--concurrent-fragments", "8"])
            .args(PRINT_FINAL_PATH)
            .arg(url);
        let output = run_tool(TOOL, &mut cmd).await?;

        let video = printed_path(&String::from_utf8_lossy(&output.stdout))?;
        info!("Downloaded: {}", video.display());
        Ok(video)
    }

    async fn fetch_audio(&self, url: &str, out_dir: &Path, quality: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(out_dir).await?;
        info!("Downloading audio for transcription");

        let mut cmd = self.command();
        cmd.args([
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            quality,
            "--format",
            "bestaudio",
            "--output",
        ])
        .arg(out_dir.join("%(title)s.%(ext)s"))
        .args(PRINT_FINAL_PATH)
        .arg(url);
        let output = run_tool(TOOL, &mut cmd).await?;

        printed_path(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Files yt-dlp leaves behind when a download is interrupted.
pub fn is_partial_download(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".part")
        || name.ends_with(".ytdl")
        || name.ends_with(".temp")
        || name.contains(".part-Frag")
}

/// Lines alternate url, title. Entries whose url is not https are skipped.
fn parse_playlist_listing(stdout: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = stdout.trim().lines().collect();
    lines
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0].trim(), pair[1].trim()))
        .filter(|(url, _)| url.starts_with("https://"))
        .map(|(url, title)| (url.to_string(), title.to_string()))
        .collect()
}

pub fn extract_video_id(url: &str) -> Option<String> {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([a-zA-Z0-9_-]{11})")
                .expect("valid regex"),
            Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]{11})").expect("valid regex"),
        ]
    });

    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .map(|caps| caps[1].to_string())
}

pub fn fallback_title(url: &str) -> String {
    match extract_video_id(url) {
        Some(id) => format!("Video {id}"),
        None => "Unknown Video".to_string(),
    }
}

/// The file yt-dlp reported for this download: the last line printed at the
/// `after_move` stage, once merging and audio extraction are done.
fn printed_path(stdout: &str) -> Result<PathBuf> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| SubsplitError::tool(TOOL, "no output file reported"))?;

    let path = PathBuf::from(line);
    if !path.is_file() {
        return Err(SubsplitError::tool(
            TOOL,
            format!("reported file {} does not exist", path.display()),
        ));
    }
    debug!("yt-dlp wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_download_names() {
        assert!(is_partial_download(Path::new("/v/lesson.mp4.part")));
        assert!(is_partial_download(Path::new("/v/lesson.f137.mp4.ytdl")));
        assert!(is_partial_download(Path::new("/v/lesson.mp4.part-Frag12")));
        assert!(is_partial_download(Path::new("lesson.temp")));
        assert!(!is_partial_download(Path::new("/v/lesson.mp4")));
        assert!(!is_partial_download(Path::new("/v/partial_lesson.mp4")));
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("https://example.com/video.mp4"), None);
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title("https://youtu.be/dQw4w9WgXcQ"), "Video dQw4w9WgXcQ");
        assert_eq!(fallback_title("not a url"), "Unknown Video");
    }

    #[test]
    fn test_parse_playlist_listing() {
        let stdout = "https://www.youtube.com/watch?v=aaaaaaaaaaa\n第一集\n\
                      NA\n私有视频\n\
                      https://www.youtube.com/watch?v=bbbbbbbbbbb\n第二集\n\
                      https://www.youtube.com/watch?v=ccccccccccc\n";
        let entries = parse_playlist_listing(stdout);
        assert_eq!(
            entries,
            vec![
                ("https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string(), "第一集".to_string()),
                ("https://www.youtube.com/watch?v=bbbbbbbbbbb".to_string(), "第二集".to_string()),
            ]
        );
    }

    #[test]
    fn test_printed_path_takes_last_line() {
        let dir = TempDir::new().unwrap();
        let older = dir.path().join("第一集.mp4");
        let wanted = dir.path().join("第二集.mp4");
        std::fs::write(&older, b"x").unwrap();
        std::fs::write(&wanted, b"x").unwrap();

        let stdout = format!("[download] 100%\n{}\n\n", wanted.display());
        assert_eq!(printed_path(&stdout).unwrap(), wanted);
    }

    #[test]
    fn test_printed_path_requires_existing_file() {
        assert!(matches!(
            printed_path(""),
            Err(SubsplitError::ExternalTool { .. })
        ));
        assert!(matches!(
            printed_path("/nonexistent/subsplit/video.mp4\n"),
            Err(SubsplitError::ExternalTool { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = YtDlp::new().with_binary("/nonexistent/yt-dlp");
        let result = fetcher.fetch_video("https://youtu.be/dQw4w9WgXcQ", dir.path()).await;
        assert!(matches!(result, Err(SubsplitError::ExternalTool { .. })));
    }
}
