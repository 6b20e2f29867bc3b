//! Axum route handlers for the coaching API.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::coaching::dispatcher::{
    self, AnalyzeCvRequest, GenerateCvRequest, GenerateQuestionsRequest,
};
use crate::coaching::models::{CoachReply, CvAnalysis};
use crate::collaborators::ocr::ACCEPTED_MIME_TYPES;
use crate::errors::AppError;
use crate::state::AppState;

/// Uploads smaller than this cannot plausibly contain recorded speech.
const MIN_AUDIO_BYTES: usize = 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeminiRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub transcription: String,
    #[serde(flatten)]
    pub reply: CoachReply,
}

#[derive(Debug, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TextToSpeechResponse {
    pub audio: String,
    pub format: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadCvResponse {
    pub cv_text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateCvResponse {
    pub cv_markdown: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/gemini
///
/// Evaluates typed user text. The reply is either an interview-answer
/// evaluation or a general answer; extraction failures come back as the
/// encouraging fallback, never as an error.
pub async fn handle_gemini(
    State(state): State<AppState>,
    Json(request): Json<GeminiRequest>,
) -> Result<Json<CoachReply>, AppError> {
    let reply = dispatcher::evaluate_answer(state.llm.as_ref(), &request.prompt).await?;
    Ok(Json(reply))
}

/// POST /api/process-voice
///
/// Multipart audio upload → transcription → answer evaluation.
/// A transcription failure short-circuits before any prompt is built.
pub async fn handle_process_voice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VoiceResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    if upload.bytes.len() < MIN_AUDIO_BYTES {
        return Err(AppError::Validation(format!(
            "audio payload too small ({} bytes) to contain speech",
            upload.bytes.len()
        )));
    }

    let transcription = state
        .speech
        .transcribe(&upload.bytes)
        .await
        .map_err(|e| AppError::Transcription(e.to_string()))?;

    let reply = dispatcher::evaluate_voice_answer(state.llm.as_ref(), &transcription).await?;

    Ok(Json(VoiceResponse {
        transcription,
        reply,
    }))
}

/// POST /api/text-to-speech
///
/// Synthesizes MP3 audio for the given text; audio is base64 in the body.
pub async fn handle_text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<TextToSpeechRequest>,
) -> Result<Json<TextToSpeechResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let audio = state
        .tts
        .synthesize(&request.text)
        .await
        .map_err(|e| AppError::Synthesis(e.to_string()))?;

    Ok(Json(TextToSpeechResponse {
        audio,
        format: "mp3",
    }))
}

/// POST /api/upload-cv
///
/// Multipart document upload → extracted plain text. The OCR adapter
/// decides per MIME type; unsupported types surface as OCR failures.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadCvResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    if upload.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let mime_type = upload
        .content_type
        .or_else(|| upload.file_name.as_deref().and_then(mime_from_extension))
        .ok_or_else(|| AppError::Validation("could not determine file type".to_string()))?;

    if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AppError::Ocr(format!(
            "unsupported document type: {mime_type}"
        )));
    }

    let cv_text = state
        .ocr
        .extract_text(&upload.bytes, &mime_type)
        .await
        .map_err(|e| AppError::Ocr(e.to_string()))?;

    Ok(Json(UploadCvResponse { cv_text }))
}

/// POST /api/analyze-cv
///
/// Structured profile analysis of raw CV text. Extraction failures are
/// surfaced with a truncated raw-text excerpt for debugging.
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeCvRequest>,
) -> Result<Json<CvAnalysis>, AppError> {
    let analysis = dispatcher::analyze_cv(state.llm.as_ref(), &request).await?;
    Ok(Json(analysis))
}

/// POST /api/generate-cv
///
/// Generates a Markdown CV from profile fields.
pub async fn handle_generate_cv(
    State(state): State<AppState>,
    Json(request): Json<GenerateCvRequest>,
) -> Result<Json<GenerateCvResponse>, AppError> {
    let cv_markdown = dispatcher::generate_cv(state.llm.as_ref(), &request).await?;
    Ok(Json(GenerateCvResponse { cv_markdown }))
}

/// POST /api/generate-questions
///
/// Generates tagged interview questions for a field/role/skill set.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    let questions = dispatcher::generate_questions(state.llm.as_ref(), &request).await?;
    Ok(Json(GenerateQuestionsResponse { questions }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

struct Upload {
    bytes: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

/// Reads the first file-bearing field of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
        return Ok(Upload {
            bytes,
            content_type,
            file_name,
        });
    }
    Err(AppError::Validation(
        "multipart body contained no file field".to_string(),
    ))
}

/// Maps a filename extension to a MIME type when the browser omits one.
fn mime_from_extension(file_name: &str) -> Option<String> {
    let extension = file_name.rsplit('.').next()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(mime.to_string())
}
