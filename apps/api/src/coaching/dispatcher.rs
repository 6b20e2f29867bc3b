//! Task dispatch — one operation per coaching task.
//!
//! Every operation follows the same pipeline: validate required fields
//! (a missing field fails before any model call), build the prompt,
//! invoke the model, extract the typed result or its fallback.

use serde::Deserialize;

use crate::coaching::extract;
use crate::coaching::models::{CoachReply, CvAnalysis};
use crate::coaching::prompts;
use crate::errors::AppError;
use crate::llm_client::ModelClient;

#[derive(Debug, Deserialize)]
pub struct AnalyzeCvRequest {
    pub cv_text: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCvRequest {
    pub role: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub field: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Evaluates free-form user text: either an interview-answer evaluation
/// or a general answer, chosen by the model. Extraction failures are
/// masked by the fallback reply, so this only errors when the input is
/// empty or the model call itself fails.
pub async fn evaluate_answer(
    llm: &dyn ModelClient,
    user_text: &str,
) -> Result<CoachReply, AppError> {
    if user_text.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let prompt = prompts::coach_reply_prompt(user_text);
    let raw = llm.invoke(&prompt).await?;

    Ok(extract::extract_coach_reply(&raw))
}

/// Voice pipeline tail: evaluates an already-transcribed answer.
/// Transcription failures short-circuit in the handler before this runs.
pub async fn evaluate_voice_answer(
    llm: &dyn ModelClient,
    transcript: &str,
) -> Result<CoachReply, AppError> {
    if transcript.trim().is_empty() {
        return Err(AppError::Validation(
            "transcription produced no text to evaluate".to_string(),
        ));
    }
    evaluate_answer(llm, transcript).await
}

/// Analyzes CV text against an optional target role/organization.
pub async fn analyze_cv(
    llm: &dyn ModelClient,
    request: &AnalyzeCvRequest,
) -> Result<CvAnalysis, AppError> {
    if request.cv_text.trim().is_empty() {
        return Err(AppError::Validation("cv_text cannot be empty".to_string()));
    }

    let prompt =
        prompts::cv_analysis_prompt(&request.cv_text, &request.role, &request.organization);
    let raw = llm.invoke(&prompt).await?;

    extract::extract_cv_analysis(&raw).map_err(|f| AppError::Extraction {
        reason: f.reason,
        raw: f.raw,
    })
}

/// Generates a Markdown CV from profile fields. No JSON extraction on
/// this path; the model's text is returned after fence stripping.
pub async fn generate_cv(
    llm: &dyn ModelClient,
    request: &GenerateCvRequest,
) -> Result<String, AppError> {
    if request.role.trim().is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if request.skills.is_empty() {
        return Err(AppError::Validation("skills cannot be empty".to_string()));
    }
    if request.experience.trim().is_empty() {
        return Err(AppError::Validation(
            "experience cannot be empty".to_string(),
        ));
    }
    if request.education.trim().is_empty() {
        return Err(AppError::Validation(
            "education cannot be empty".to_string(),
        ));
    }

    let prompt = prompts::cv_generation_prompt(
        &request.role,
        &request.skills,
        &request.experience,
        &request.education,
        &request.achievements,
    );
    let raw = llm.invoke(&prompt).await?;

    Ok(extract::extract_cv_markdown(&raw))
}

/// Generates tagged interview questions for a field/role/skill set.
pub async fn generate_questions(
    llm: &dyn ModelClient,
    request: &GenerateQuestionsRequest,
) -> Result<Vec<String>, AppError> {
    if request.field.trim().is_empty() {
        return Err(AppError::Validation("field cannot be empty".to_string()));
    }

    let prompt = prompts::question_prompt(&request.field, &request.role, &request.skills);
    let raw = llm.invoke(&prompt).await?;

    extract::extract_questions(&raw).map_err(|f| AppError::Extraction {
        reason: f.reason,
        raw: f.raw,
    })
}
