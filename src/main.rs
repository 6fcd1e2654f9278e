use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subsplit::config::Config;
use subsplit::manifest::{JobStatus, ManifestStore, Playlist, VideoJob};
use subsplit::media::{Ffmpeg, YtDlp};
use subsplit::scheduler::{JobScheduler, RunReport};
use subsplit::transcribe::WhisperClient;
use subsplit::{Collaborators, JobPipeline, PipelineConfig};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "subsplit")]
#[command(version, about = "Split videos into subtitled practice clips")]
#[command(
    long_about = "Download videos, transcribe them with OpenAI Whisper, and cut each one into overlapping parts with matching subtitle files."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Add videos to a playlist in the manifest
    Add(AddArgs),
    /// Process pending videos
    Process(ProcessArgs),
    /// Show per-playlist job counts
    Status,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "video", "videos"])))]
struct AddArgs {
    /// Playlist id, also its directory name
    #[arg(long)]
    playlist: String,

    /// Playlist display title (defaults to the id, title-cased)
    #[arg(long)]
    title: Option<String>,

    /// Number of parts per video
    #[arg(long)]
    splits: Option<u32>,

    /// Remote playlist URL; replaces the playlist's entries
    #[arg(long)]
    url: Option<String>,

    /// Single video URL
    #[arg(long)]
    video: Option<String>,

    /// Video URLs, or files with one URL per line
    #[arg(long, num_args = 1..)]
    videos: Vec<String>,
}

#[derive(Args)]
struct ProcessArgs {
    /// Number of videos to process (default: all)
    count: Option<usize>,

    /// Number of videos to process
    #[arg(long = "count", id = "count_flag")]
    count_flag: Option<usize>,

    /// Download retries per video
    #[arg(long)]
    retries: Option<u32>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// `hsk_level_1` → `Hsk Level 1`
fn default_playlist_title(playlist_id: &str) -> String {
    playlist_id
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// URLs from a list file, skipping blank lines and `#` comments.
fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

async fn add(config: &Config, args: AddArgs) -> Result<()> {
    let splits = args.splits.unwrap_or(config.default_splits);
    Config {
        default_splits: splits,
        ..config.clone()
    }
    .validate_layout()
    .context("Configuration validation failed")?;

    let title = args
        .title
        .unwrap_or_else(|| default_playlist_title(&args.playlist));
    let ytdlp = YtDlp::new();
    let mut store = ManifestStore::open(config.workspace().manifest_path())
        .context("Failed to open manifest")?;

    if let Some(url) = args.url {
        let entries = ytdlp
            .list_playlist(&url)
            .await
            .context("Failed to list playlist")?;
        let videos: Vec<VideoJob> = entries
            .into_iter()
            .map(|(video_url, video_title)| VideoJob::new(video_url, video_title, splits))
            .collect();
        let count = videos.len();
        store.put_playlist(
            &args.playlist,
            Playlist {
                title: title.clone(),
                url: Some(url),
                videos,
            },
        )?;
        println!(
            "{} Added playlist '{}' with {} videos",
            style("✓").green(),
            title,
            count
        );
        return Ok(());
    }

    let mut urls = Vec::new();
    for source in args.video.into_iter().chain(args.videos) {
        let path = PathBuf::from(&source);
        if path.is_file() {
            info!("Reading videos from {}", path.display());
            urls.extend(read_url_list(&path)?);
        } else {
            urls.push(source);
        }
    }

    let mut videos = Vec::with_capacity(urls.len());
    for url in urls {
        let video_title = ytdlp.fetch_title(&url).await;
        println!("{} Added: {}", style("✓").green(), video_title);
        videos.push(VideoJob::new(url, video_title, splits));
    }

    let total = store.add_videos(&args.playlist, &title, videos)?;
    println!("{} Playlist '{}' now has {} videos", style("✓").green(), title, total);
    Ok(())
}

async fn process(mut config: Config, args: ProcessArgs, verbose: bool) -> Result<RunReport> {
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    let api_key = config.openai_api_key.clone().unwrap_or_default();
    let ffmpeg = Ffmpeg::new();
    ffmpeg.check().await.context("FFmpeg is required")?;

    let tools = Collaborators {
        fetcher: Arc::new(YtDlp::new()),
        toolkit: Arc::new(ffmpeg),
        transcriber: Arc::new(WhisperClient::new(api_key)),
    };
    let workspace = config.workspace();
    let pipeline = JobPipeline::new(tools, PipelineConfig::from_config(&config), workspace.clone());
    let store = ManifestStore::open(workspace.manifest_path()).context("Failed to open manifest")?;

    info!("Workspace: {}", workspace.base_dir().display());
    info!("Language:  {}", config.language);
    info!("Retries:   {}", config.max_retries);

    let mut scheduler = JobScheduler::new(store, pipeline).with_progress(!verbose);
    let report = scheduler.run(args.count.or(args.count_flag)).await?;
    Ok(report)
}

fn print_report(report: &RunReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Processing Complete                      ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    if report.scrubbed > 0 {
        println!("  Recovered:  {}", report.scrubbed);
    }
    println!("  Processed:  {}", report.processed);
    println!("  Completed:  {}", style(report.completed).green());
    println!("  Failed:     {}", style(report.failed).red());
    println!("  Remaining:  {}", report.remaining);
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

fn status(config: &Config) -> Result<()> {
    let store = ManifestStore::open(config.workspace().manifest_path())
        .context("Failed to open manifest")?;
    let summary = store.status_summary();

    if summary.is_empty() {
        println!("No playlists in manifest");
        return Ok(());
    }

    println!("{}\n", style("Manifest status").bold());
    for playlist in summary {
        println!("{} ({})", style(&playlist.title).bold(), style(&playlist.id).dim());
        for (status, count) in &playlist.counts {
            let label = match status {
                JobStatus::Pending => style(status.to_string()).yellow(),
                JobStatus::Processing => style(status.to_string()).cyan(),
                JobStatus::Completed => style(status.to_string()).green(),
                JobStatus::Failed => style(status.to_string()).red(),
            };
            println!("   {}: {}", label, count);
        }
        println!("   total: {} videos\n", playlist.total);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Add(args) => add(&config, args).await,
        Command::Process(args) => {
            let report = process(config, args, cli.verbose).await?;
            if report.failed > 0 {
                warn!("{} videos failed; see `subsplit status`", report.failed);
            }
            print_report(&report);
            Ok(())
        }
        Command::Status => status(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_playlist_title() {
        assert_eq!(default_playlist_title("hsk_level_1"), "Hsk Level 1");
        assert_eq!(default_playlist_title("peppa"), "Peppa");
        assert_eq!(default_playlist_title("CCTV_news"), "Cctv News");
    }

    #[test]
    fn test_read_url_list_skips_comments() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("videos.txt");
        std::fs::write(
            &path,
            "# week 1\nhttps://youtu.be/aaaaaaaaaaa\n\n  https://youtu.be/bbbbbbbbbbb  \n#skip\n",
        )
        .unwrap();

        assert_eq!(
            read_url_list(&path).unwrap(),
            vec!["https://youtu.be/aaaaaaaaaaa", "https://youtu.be/bbbbbbbbbbb"]
        );
    }

    #[test]
    fn test_cli_parses_process_count() {
        let cli = Cli::try_parse_from(["subsplit", "process", "2"]).unwrap();
        match cli.command {
            Command::Process(args) => assert_eq!(args.count, Some(2)),
            _ => panic!("expected process"),
        }

        let cli = Cli::try_parse_from(["subsplit", "process", "--count", "4"]).unwrap();
        match cli.command {
            Command::Process(args) => assert_eq!(args.count.or(args.count_flag), Some(4)),
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_cli_add_requires_one_source() {
        assert!(Cli::try_parse_from(["subsplit", "add", "--playlist", "p"]).is_err());
        assert!(Cli::try_parse_from([
            "subsplit", "add", "--playlist", "p", "--video", "a", "--url", "b"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "subsplit", "add", "--playlist", "p", "--videos", "a", "b.txt"
        ])
        .is_ok());
    }
}
