use crate::error::{Result, SubsplitError};
use crate::retry::RetryPolicy;
use crate::segment::PlannerConfig;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Vtt,
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::Vtt => write!(f, "vtt"),
        }
    }
}

impl SubtitleFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    /// Workspace root; the manifest and all playlist output live under it.
    pub base_dir: PathBuf,
    pub language: String,
    pub default_splits: u32,
    pub max_retries: u32,
    pub overlap_secs: f64,
    pub search_window_secs: f64,
    pub sentence_terminals: Vec<char>,
    pub chunk_secs: u64,
    pub audio_quality: String,
    pub subtitle_format: SubtitleFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            base_dir: PathBuf::from("."),
            language: "zh".to_string(),
            default_splits: 3,
            max_retries: 3,
            overlap_secs: 15.0,
            search_window_secs: 120.0,
            sentence_terminals: vec!['。', '！', '？'],
            chunk_secs: 300,
            audio_quality: "0".to_string(),
            subtitle_format: SubtitleFormat::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                config = toml::from_str::<Config>(&contents).map_err(|e| {
                    SubsplitError::Config(format!("{}: {}", config_path.display(), e))
                })?;
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(language) = std::env::var("SUBSPLIT_LANGUAGE") {
            config.language = language;
        }
        if let Ok(retries) = std::env::var("SUBSPLIT_MAX_RETRIES") {
            if let Ok(r) = retries.parse() {
                config.max_retries = r;
            }
        }
        if let Ok(base_dir) = std::env::var("SUBSPLIT_BASE_DIR") {
            config.base_dir = PathBuf::from(base_dir);
        }

        Ok(config)
    }

    /// Checks everything a processing run needs before any job is touched.
    pub fn validate(&self) -> Result<()> {
        match self.openai_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(SubsplitError::Config(
                    "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-..."
                        .to_string(),
                ));
            }
        }

        self.validate_layout()
    }

    /// The subset of checks that does not need credentials.
    pub fn validate_layout(&self) -> Result<()> {
        if self.default_splits == 0 {
            return Err(SubsplitError::Config(
                "Split count must be at least 1".to_string(),
            ));
        }
        if !(self.overlap_secs >= 0.0) || !(self.search_window_secs >= 0.0) {
            return Err(SubsplitError::Config(
                "Overlap and search window must be non-negative".to_string(),
            ));
        }
        if self.chunk_secs == 0 {
            return Err(SubsplitError::Config(
                "Audio chunk duration must be greater than 0".to_string(),
            ));
        }
        if self.sentence_terminals.is_empty() {
            return Err(SubsplitError::Config(
                "At least one sentence-terminal symbol is required".to_string(),
            ));
        }

        Ok(())
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.base_dir)
    }

    pub fn planner(&self) -> PlannerConfig {
        PlannerConfig {
            overlap: self.overlap_secs,
            search_window: self.search_window_secs,
            sentence_terminals: self.sentence_terminals.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }

    pub fn chunk_duration(&self) -> Duration {
        Duration::from_secs(self.chunk_secs)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subsplit").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtitle_format_from_toml() {
        let config: Config = toml::from_str("subtitle_format = \"vtt\"\n").unwrap();
        assert_eq!(config.subtitle_format, SubtitleFormat::Vtt);
        assert_eq!(config.subtitle_format.extension(), "vtt");
        assert!(toml::from_str::<Config>("subtitle_format = \"json\"\n").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.language, "zh");
        assert_eq!(config.default_splits, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.overlap_secs, 15.0);
        assert_eq!(config.search_window_secs, 120.0);
        assert_eq!(config.sentence_terminals, vec!['。', '！', '？']);
        assert_eq!(config.chunk_duration(), Duration::from_secs(300));
        assert_eq!(
            config.workspace().manifest_path(),
            PathBuf::from("./manifest.json")
        );
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(SubsplitError::Config(_))));

        let config = Config {
            openai_api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_with_api_key() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_splits() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            default_splits: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(SubsplitError::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("language = \"en\"\nmax_retries = 5\n").unwrap();
        assert_eq!(config.language, "en");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.default_splits, 3);
        assert_eq!(config.subtitle_format, SubtitleFormat::Srt);
    }

    #[test]
    fn test_retry_policy_uses_configured_retries() {
        let config = Config {
            max_retries: 7,
            ..Config::default()
        };
        assert_eq!(config.retry_policy().max_retries, 7);
    }
}
