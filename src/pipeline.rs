use crate::audio::{prepare_chunks, ChunkConfig};
use crate::config::{Config, SubtitleFormat};
use crate::error::Result;
use crate::manifest::{ProducedArtifact, VideoJob};
use crate::media::{MediaFetcher, MediaToolkit};
use crate::retry::RetryPolicy;
use crate::segment::{plan_split_ranges, synchronize, PlannerConfig};
use crate::subtitle::create_formatter;
use crate::transcribe::{transcribe_chunks, Transcriber};
use crate::workspace::Workspace;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Settings for driving one video through the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language hint for transcription.
    pub language: String,
    /// yt-dlp audio quality for the transcription download.
    pub audio_quality: String,
    /// Split planning.
    pub planner: PlannerConfig,
    /// Retry policy for downloads.
    pub retry: RetryPolicy,
    /// Upload size ceiling and chunk length for transcription.
    pub chunk: ChunkConfig,
    /// Subtitle file format.
    pub subtitle_format: SubtitleFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.language.clone(),
            audio_quality: config.audio_quality.clone(),
            planner: config.planner(),
            retry: config.retry_policy(),
            chunk: ChunkConfig {
                chunk_duration: config.chunk_duration(),
                ..ChunkConfig::default()
            },
            subtitle_format: config.subtitle_format,
        }
    }
}

/// The external tools a job needs.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn MediaFetcher>,
    pub toolkit: Arc<dyn MediaToolkit>,
    pub transcriber: Arc<dyn Transcriber>,
}

/// Download → probe → transcribe → plan → synchronize → cut, for one video.
pub struct JobPipeline {
    tools: Collaborators,
    config: PipelineConfig,
    workspace: Workspace,
}

impl JobPipeline {
    pub fn new(tools: Collaborators, config: PipelineConfig, workspace: Workspace) -> Self {
        Self {
            tools,
            config,
            workspace,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Produce every clip and subtitle file for `job`.
    ///
    /// `scratch` belongs to this job and is cleaned up by the caller. The returned
    /// artifacts are relative to the workspace root, one per planned part.
    pub async fn process_video(
        &self,
        playlist_id: &str,
        job: &VideoJob,
        scratch: &Path,
    ) -> Result<Vec<ProducedArtifact>> {
        let started = Instant::now();
        let videos_dir = self.workspace.videos_dir(playlist_id);
        let processed_dir = self.workspace.processed_dir(playlist_id);
        tokio::fs::create_dir_all(&processed_dir).await?;

        // Stage 1: source video
        let fetcher = self.tools.fetcher.as_ref();
        let video = self
            .config
            .retry
            .run("video download", || fetcher.fetch_video(&job.url, &videos_dir))
            .await?;
        let duration = self.tools.toolkit.probe_duration(&video).await?;
        info!("Video duration: {:.1}min", duration / 60.0);

        // Stage 2: transcript
        let audio_dir = scratch.join("audio");
        let audio = self
            .config
            .retry
            .run("audio download", || {
                fetcher.fetch_audio(&job.url, &audio_dir, &self.config.audio_quality)
            })
            .await?;
        let chunk_config = ChunkConfig {
            max_file_size: self
                .config
                .chunk
                .max_file_size
                .min(self.tools.transcriber.max_file_size()),
            ..self.config.chunk.clone()
        };
        let chunks = prepare_chunks(
            self.tools.toolkit.as_ref(),
            &audio,
            &scratch.join("chunks"),
            &chunk_config,
        )
        .await?;
        let segments =
            transcribe_chunks(self.tools.transcriber.as_ref(), &chunks, &self.config.language)
                .await?;

        // Stage 3: one geometry for both the clips and their subtitles
        let ranges = plan_split_ranges(&segments, duration, job.splits, &self.config.planner)?;
        let parts = synchronize(&segments, &ranges);
        info!("Splitting into {} parts", parts.len());

        // Stage 4: cut and write
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let formatter = create_formatter(self.config.subtitle_format);
        let mut artifacts = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let clip = processed_dir.join(format!("{}_part{}.mp4", stem, i + 1));
            debug!(
                "Part {}: {:.3}s..{:.3}s, {} captions",
                i + 1,
                part.range.start,
                part.range.end,
                part.entries.len()
            );
            self.tools
                .toolkit
                .cut(&video, part.range.start, part.range.duration(), &clip)
                .await?;

            let subtitles = if part.is_empty() {
                info!("Part {} has no speech, skipping subtitles", i + 1);
                None
            } else {
                let path = processed_dir.join(format!(
                    "{}_part{}.{}",
                    stem,
                    i + 1,
                    formatter.extension()
                ));
                tokio::fs::write(&path, formatter.format(&part.entries)).await?;
                Some(self.workspace.relative(&path))
            };

            artifacts.push(ProducedArtifact {
                video: self.workspace.relative(&clip),
                srt: subtitles,
            });
        }

        info!(
            "Finished {} parts in {:.1}s",
            artifacts.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.language, "zh");
        assert_eq!(config.audio_quality, "0");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.planner.overlap, 15.0);
        assert_eq!(config.chunk.chunk_duration.as_secs(), 300);
        assert_eq!(config.subtitle_format, SubtitleFormat::Srt);
    }
}
