//! Document text extraction: local `pdf-extract` for PDFs, Google Cloud
//! Vision document OCR for images.

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// MIME types the upload route accepts. DOCX is listed because the
/// route accepts the upload; the adapter then reports it unsupported.
pub const ACCEPTED_MIME_TYPES: [&str; 6] = [
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/tiff",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const IMAGE_MIME_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/tiff"];

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Unsupported document type: {0}")]
    UnsupportedMime(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("No text found in the document")]
    NoText,

    #[error("Worker task failed: {0}")]
    Worker(String),
}

#[async_trait]
pub trait DocumentOcr: Send + Sync {
    async fn extract_text(&self, bytes: &[u8], mime_type: &str) -> Result<String, OcrError>;
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateEntry>,
}

#[derive(Debug, Serialize)]
struct AnnotateEntry {
    image: AnnotateImage,
    features: Vec<AnnotateFeature>,
}

#[derive(Debug, Serialize)]
struct AnnotateImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnnotateFeature {
    #[serde(rename = "type")]
    feature_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    full_text_annotation: Option<FullTextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    text: Option<String>,
}

impl AnnotateResponse {
    fn text(&self) -> Option<&str> {
        self.responses
            .first()
            .and_then(|r| r.full_text_annotation.as_ref())
            .and_then(|a| a.text.as_deref())
    }
}

/// Production OCR adapter. PDF bytes never leave the process; image
/// bytes go to the Vision document-text endpoint.
#[derive(Clone)]
pub struct GoogleVisionOcr {
    client: Client,
    api_key: String,
}

impl GoogleVisionOcr {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    async fn ocr_image(&self, bytes: &[u8]) -> Result<String, OcrError> {
        let request_body = AnnotateRequest {
            requests: vec![AnnotateEntry {
                image: AnnotateImage {
                    content: BASE64_STANDARD.encode(bytes),
                },
                features: vec![AnnotateFeature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                }],
            }],
        };

        let response = self
            .client
            .post(VISION_API_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let annotated: AnnotateResponse = response.json().await?;
        annotated
            .text()
            .map(str::to_owned)
            .ok_or(OcrError::NoText)
    }
}

#[async_trait]
impl DocumentOcr for GoogleVisionOcr {
    async fn extract_text(&self, bytes: &[u8], mime_type: &str) -> Result<String, OcrError> {
        if mime_type == "application/pdf" {
            // pdf-extract is synchronous and CPU-bound; keep it off the
            // async scheduler.
            let owned = bytes.to_vec();
            let text = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&owned).map_err(|e| OcrError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Worker(e.to_string()))??;

            if text.trim().is_empty() {
                return Err(OcrError::NoText);
            }
            debug!("extracted {} chars from PDF", text.len());
            return Ok(text);
        }

        if IMAGE_MIME_TYPES.contains(&mime_type) {
            return self.ocr_image(bytes).await;
        }

        Err(OcrError::UnsupportedMime(mime_type.to_string()))
    }
}
