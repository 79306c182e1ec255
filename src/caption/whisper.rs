use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ClipstormError, Result};

use super::{Transcriber, TranscriptSegment};

/// OpenAI Whisper API endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Maximum file size for Whisper API (25 MB).
const MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// OpenAI Whisper API client.
///
/// One request per voice-over; trimmed narration tracks fit comfortably
/// under the API's size limit, so no chunking is needed.
pub struct WhisperClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    language: Option<String>,
}

impl WhisperClient {
    /// Create a new Whisper client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: WHISPER_API_URL.to_string(),
            api_key,
            language: None,
        }
    }

    /// Set the source language (ISO 639-1 code).
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    /// Point the client at a different endpoint (tests use a local stub).
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    /// Build the multipart form for the API request.
    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mime_type = match audio_path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            _ => "application/octet-stream",
        };

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        Ok(form)
    }

    /// Make the API request (form is consumed, so no retries at this level).
    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(&self.api_url)
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
            return Err(ClipstormError::Api(format!(
                "Whisper API error ({}): {} ({})",
                status, api_error.error.message, api_error.error.r#type
            )));
        }

        Err(ClipstormError::Api(format!(
            "Whisper API error ({}): {}",
            status, error_body
        )))
    }

    /// Transcribe with retry logic - rebuilds form on each attempt.
    async fn transcribe_with_retry(&self, audio_path: &Path) -> Result<WhisperResponse> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let form = self.build_form(audio_path).await?;

            match self.call_api(form).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    // Don't retry on client errors
                    let error_str = e.to_string();
                    if error_str.contains("API error (4") {
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClipstormError::Api("Unknown error".to_string())))
    }

    fn parse_response(&self, response: WhisperResponse) -> Vec<TranscriptSegment> {
        let mut segments = Vec::new();

        if let Some(api_segments) = response.segments {
            for seg in api_segments {
                segments.push(TranscriptSegment {
                    text: seg.text.trim().to_string(),
                    start: Duration::from_secs_f64(seg.start.max(0.0)),
                    end: Duration::from_secs_f64(seg.end.max(0.0)),
                });
            }
        } else if !response.text.trim().is_empty() {
            // Fallback: one segment spanning the whole track.
            segments.push(TranscriptSegment {
                text: response.text.trim().to_string(),
                start: Duration::ZERO,
                end: Duration::from_secs_f64(response.duration.max(0.0)),
            });
        }

        segments
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing {:?} with Whisper", audio);

        let metadata = fs::metadata(audio).await?;
        if metadata.len() as usize > MAX_FILE_SIZE {
            return Err(ClipstormError::Transcription(format!(
                "File too large for Whisper API: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            )));
        }

        let response = self.transcribe_with_retry(audio).await?;
        let segments = self.parse_response(response);

        debug!("Whisper returned {} segments for {:?}", segments.len(), audio);

        Ok(segments)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct WhisperResponse {
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
    fn test_parse_response_with_segments() {
        let client = WhisperClient::new("test-key".to_string());

        let response = WhisperResponse {
            text: "Hello world. How are you?".to_string(),
            segments: Some(vec![
                WhisperSegment {
                    start: 0.0,
                    end: 2.0,
                    text: " Hello world. ".to_string(),
                },
                WhisperSegment {
                    start: 2.5,
                    end: 4.0,
                    text: "How are you?".to_string(),
                },
            ]),
            duration: 4.0,
        };

        let segments = client.parse_response(response);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello world.");
        assert_eq!(segments[1].start, Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_response_without_segments() {
        let client = WhisperClient::new("test-key".to_string());

        let response = WhisperResponse {
            text: "Hello world".to_string(),
            segments: None,
            duration: 2.0,
        };

        let segments = client.parse_response(response);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, Duration::ZERO);
        assert_eq!(segments[0].end, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_transcribe_missing_file() {
        let client = WhisperClient::new("test-key".to_string());
        let result = client.transcribe(Path::new("/nonexistent/voice.wav")).await;
        assert!(result.is_err());
    }
}
