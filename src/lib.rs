pub mod audio;
pub mod config;
pub mod error;
pub mod manifest;
pub mod media;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod segment;
pub mod subtitle;
pub mod transcribe;
pub mod workspace;

pub use config::Config;
pub use error::{Result, SubsplitError};
pub use manifest::{JobStatus, ManifestStore};
pub use pipeline::{Collaborators, JobPipeline, PipelineConfig};
pub use scheduler::{JobScheduler, RunReport};
pub use workspace::Workspace;
