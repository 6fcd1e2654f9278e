pub mod whisper;

pub use whisper::WhisperClient;

use crate::audio::AudioChunk;
use crate::error::Result;
use crate::segment::TranscriptSegment;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Segments timed from the start of `audio`.
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Vec<TranscriptSegment>>;
    fn name(&self) -> &'static str;
    fn max_file_size(&self) -> u64;
}

/// Transcribe chunks one after another and merge them onto the source timeline.
pub async fn transcribe_chunks(
    transcriber: &dyn Transcriber,
    chunks: &[AudioChunk],
    language: &str,
) -> Result<Vec<TranscriptSegment>> {
    let mut segments = Vec::new();

    for chunk in chunks {
        info!(
            "Transcribing chunk {}/{} with {}",
            chunk.index + 1,
            chunks.len(),
            transcriber.name()
        );
        let offset = chunk.offset.as_secs_f64();
        let chunk_segments = transcriber.transcribe(&chunk.path, language).await?;
        segments.extend(chunk_segments.iter().map(|s| s.shifted(offset)));
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    info!("Transcription produced {} segments", segments.len());
    Ok(segments)
}
