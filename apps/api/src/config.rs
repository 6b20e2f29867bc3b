use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Immutable after startup; every vendor adapter borrows from it.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub speech_api_key: String,
    pub vision_api_key: String,
    pub tts_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = require_env("GEMINI_API_KEY")?;

        Ok(Config {
            // Media adapters accept dedicated keys but fall back to the
            // Gemini key for single-project Google Cloud setups.
            speech_api_key: std::env::var("GOOGLE_SPEECH_API_KEY")
                .unwrap_or_else(|_| gemini_api_key.clone()),
            vision_api_key: std::env::var("GOOGLE_VISION_API_KEY")
                .unwrap_or_else(|_| gemini_api_key.clone()),
            tts_api_key: std::env::var("GOOGLE_TTS_API_KEY")
                .unwrap_or_else(|_| gemini_api_key.clone()),
            gemini_api_key,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
