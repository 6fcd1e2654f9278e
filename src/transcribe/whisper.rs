use crate::error::{Result, SubsplitError};
use crate::segment::TranscriptSegment;
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// OpenAI API root.
const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Maximum file size for Whisper API (25 MB).
const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// The only model that returns timed segments in `verbose_json`.
const MODEL: &str = "whisper-1";

/// OpenAI Whisper API client.
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WhisperClient {
    /// Create a new Whisper client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Send requests to another API root (a proxy, or a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/audio/transcriptions", self.base_url)
    }

    async fn build_form(&self, audio_path: &Path, language: &str) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let mime_type = match audio_path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            Some("webm") => "audio/webm",
            _ => "application/octet-stream",
        };

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_type)?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("language", language.to_string());

        Ok(form)
    }

    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            let parsed: WhisperResponse = serde_json::from_str(&body)?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(SubsplitError::Transcription(format!(
                "Whisper API error ({}): {} ({})",
                status, api_error.error.message, api_error.error.r#type
            )));
        }

        Err(SubsplitError::Transcription(format!(
            "Whisper API error ({}): {}",
            status, error_body
        )))
    }
}

/// Segments with no positive length are dropped; a response without segments
/// becomes one segment spanning the reported duration.
fn parse_response(response: WhisperResponse) -> Vec<TranscriptSegment> {
    match response.segments {
        Some(segments) => segments
            .into_iter()
            .filter(|s| s.end > s.start)
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
            .collect(),
        None if !response.text.trim().is_empty() && response.duration > 0.0 => vec![
            TranscriptSegment::new(0.0, response.duration, response.text.trim()),
        ],
        None => Vec::new(),
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing {:?} with Whisper", audio);

        let metadata = fs::metadata(audio).await?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(SubsplitError::Transcription(format!(
                "File too large for Whisper API: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            )));
        }

        let form = self.build_form(audio, language).await?;
        let response = self.call_api(form).await?;
        let segments = parse_response(response);

        debug!("Whisper returned {} segments", segments.len());
        Ok(segments)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }

    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Option<Vec<WhisperSegment>>,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_with_base_url() {
        let client = WhisperClient::new("k".to_string()).with_base_url("http://127.0.0.1:9000/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:9000/v1/audio/transcriptions");
    }

    #[test]
    fn test_parse_response_with_segments() {
        let response: WhisperResponse = serde_json::from_str(
            r#"{"text": "你好。今天很好。", "language": "chinese", "duration": 4.0,
                "segments": [
                    {"id": 0, "start": 0.0, "end": 2.0, "text": " 你好。"},
                    {"id": 1, "start": 2.5, "end": 2.5, "text": "空"},
                    {"id": 2, "start": 2.5, "end": 4.0, "text": "今天很好。 "}
                ]}"#,
        )
        .unwrap();

        let segments = parse_response(response);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], TranscriptSegment::new(0.0, 2.0, "你好。"));
        assert_eq!(segments[1].text, "今天很好。");
    }

    #[test]
    fn test_parse_response_without_segments() {
        let response = WhisperResponse {
            text: "Hello world".to_string(),
            segments: None,
            duration: 2.0,
        };

        let segments = parse_response(response);
        assert_eq!(segments, vec![TranscriptSegment::new(0.0, 2.0, "Hello world")]);
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_request() {
        let client = WhisperClient::new("test-key".to_string());
        let result = client
            .transcribe(Path::new("/tmp/nonexistent_subsplit_test.mp3"), "zh")
            .await;
        assert!(matches!(result, Err(SubsplitError::Io(_))));
    }
}
