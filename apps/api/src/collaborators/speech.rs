//! Speech-to-text adapter (Google Cloud Speech REST).

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const SPEECH_API_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("No speech recognized in the audio")]
    NoSpeech,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    language_code: &'static str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    transcript: Option<String>,
}

impl RecognizeResponse {
    /// Joins the top alternative of each result into one transcript.
    fn transcript(&self) -> String {
        self.results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .filter_map(|a| a.transcript.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Google Cloud Speech adapter. Browser recordings arrive as
/// webm/opus, so the encoding is fixed to match.
#[derive(Clone)]
pub struct GoogleSpeech {
    client: Client,
    api_key: String,
}

impl GoogleSpeech {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SpeechToText for GoogleSpeech {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError> {
        let request_body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "WEBM_OPUS",
                language_code: "en-US",
            },
            audio: RecognitionAudio {
                content: BASE64_STANDARD.encode(audio),
            },
        };

        let response = self
            .client
            .post(SPEECH_API_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let recognized: RecognizeResponse = response.json().await?;
        let transcript = recognized.transcript();

        if transcript.trim().is_empty() {
            return Err(TranscriptionError::NoSpeech);
        }

        debug!("transcribed {} bytes of audio", audio.len());
        Ok(transcript)
    }
}
