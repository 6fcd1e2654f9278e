use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SubsplitError};
use crate::media::MediaToolkit;

use super::AudioChunk;

/// Hosted speech-to-text upload ceiling (25 MB).
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Configuration for audio chunking.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Files above this size are split before upload.
    pub max_file_size: u64,

    /// Length of each chunk when splitting.
    pub chunk_duration: Duration,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_UPLOAD_BYTES,
            chunk_duration: Duration::from_secs(300),
        }
    }
}

/// Turn a downloaded audio file into uploadable chunks.
///
/// Small files pass through as a single chunk at offset zero. Larger ones are cut
/// into fixed-length pieces, and chunk `i` starts at `i * chunk_duration`.
pub async fn prepare_chunks(
    toolkit: &dyn MediaToolkit,
    audio: &Path,
    out_dir: &Path,
    config: &ChunkConfig,
) -> Result<Vec<AudioChunk>> {
    let size = tokio::fs::metadata(audio).await?.len();
    info!("Audio size: {:.1}MB", size as f64 / (1024.0 * 1024.0));

    if size <= config.max_file_size {
        debug!("Audio fits in one upload");
        return Ok(vec![AudioChunk {
            index: 0,
            path: audio.to_path_buf(),
            offset: Duration::ZERO,
        }]);
    }

    if config.chunk_duration.is_zero() {
        return Err(SubsplitError::Config(
            "Audio chunk duration must be greater than 0".to_string(),
        ));
    }

    let paths = toolkit
        .segment_audio(audio, config.chunk_duration, out_dir)
        .await?;
    if paths.is_empty() {
        return Err(SubsplitError::tool(
            "ffmpeg",
            format!("splitting {} produced no chunks", audio.display()),
        ));
    }

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(index, path)| AudioChunk {
            index,
            path,
            offset: config.chunk_duration * index as u32,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FakeToolkit;

    #[async_trait]
    impl MediaToolkit for FakeToolkit {
        async fn probe_duration(&self, _input: &Path) -> Result<f64> {
            Ok(900.0)
        }

        async fn cut(&self, _: &Path, _: f64, _: f64, _: &Path) -> Result<()> {
            Ok(())
        }

        async fn segment_audio(
            &self,
            _input: &Path,
            _chunk: Duration,
            out_dir: &Path,
        ) -> Result<Vec<PathBuf>> {
            Ok((0..3)
                .map(|i| out_dir.join(format!("chunk_{:03}.mp3", i)))
                .collect())
        }
    }

    #[test]
    fn test_chunk_config_default() {
        let config = ChunkConfig::default();
        assert_eq!(config.max_file_size, 25 * 1024 * 1024);
        assert_eq!(config.chunk_duration, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_small_file_is_single_chunk() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("talk.mp3");
        std::fs::write(&audio, vec![0u8; 1024]).unwrap();

        let chunks = prepare_chunks(&FakeToolkit, &audio, dir.path(), &ChunkConfig::default())
            .await
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].path, audio);
        assert_eq!(chunks[0].offset, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_large_file_chunks_are_offset() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("talk.mp3");
        std::fs::write(&audio, vec![0u8; 2048]).unwrap();
        let config = ChunkConfig {
            max_file_size: 1024,
            ..ChunkConfig::default()
        };

        let chunks = prepare_chunks(&FakeToolkit, &audio, dir.path(), &config)
            .await
            .unwrap();

        let offsets: Vec<u64> = chunks.iter().map(|c| c.offset.as_secs()).collect();
        assert_eq!(offsets, vec![0, 300, 600]);
        assert_eq!(chunks[2].index, 2);
    }

    #[tokio::test]
    async fn test_missing_audio_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = prepare_chunks(
            &FakeToolkit,
            &dir.path().join("missing.mp3"),
            dir.path(),
            &ChunkConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(SubsplitError::Io(_))));
    }
}
