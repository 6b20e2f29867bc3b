//! Text-to-speech adapter (Google Cloud Text-to-Speech REST, MP3 out).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TTS_API_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Synthesis returned no audio")]
    EmptyAudio,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes MP3 audio for the text and returns it base64-encoded.
    /// The vendor responds with base64 already, so the encoding is passed
    /// straight through to the API response.
    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

#[derive(Clone)]
pub struct GoogleTts {
    client: Client,
    api_key: String,
}

impl GoogleTts {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError> {
        let request_body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: "en-US",
                name: "en-US-Neural2-F",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response = self
            .client
            .post(TTS_API_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let synthesized: SynthesizeResponse = response.json().await?;
        synthesized
            .audio_content
            .filter(|audio| !audio.is_empty())
            .ok_or(SynthesisError::EmptyAudio)
    }
}
