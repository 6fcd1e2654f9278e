pub mod chunk;

pub use chunk::{prepare_chunks, ChunkConfig};

use std::path::PathBuf;
use std::time::Duration;

/// A piece of the source audio ready for transcription.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    pub path: PathBuf,
    /// Where this chunk starts on the source timeline.
    pub offset: Duration,
}
