use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubsplitError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: &'static str, message: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Manifest inconsistency: {0}")]
    StateConsistency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubsplitError {
    pub fn tool(tool: &'static str, message: impl Into<String>) -> Self {
        SubsplitError::ExternalTool {
            tool,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SubsplitError>;
