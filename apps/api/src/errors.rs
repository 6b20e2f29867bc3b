#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Extraction failures for the coach-reply shape never reach this type —
/// the dispatcher masks them with a fallback payload. Only the question
/// and CV-analysis shapes surface `Extraction` to the wire.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Extraction failed: {reason}")]
    Extraction { reason: String, raw: String },

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::ModelUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model call failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("AI model error: {msg}") })),
                )
                    .into_response()
            }
            AppError::Extraction { reason, raw } => {
                tracing::error!("Extraction failed: {reason}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": reason, "raw": raw })),
                )
                    .into_response()
            }
            AppError::Transcription(msg) => {
                tracing::error!("Transcription failed: {msg}");
                // The voice endpoint contract always carries a transcription
                // field, empty on failure.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg, "transcription": "" })),
                )
                    .into_response()
            }
            AppError::Ocr(msg) => {
                tracing::error!("OCR failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            AppError::Synthesis(msg) => {
                tracing::error!("Speech synthesis failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": msg })),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal server error occurred" })),
                )
                    .into_response()
            }
        }
    }
}
