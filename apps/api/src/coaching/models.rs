//! Typed shapes the model is contracted to produce.
//!
//! Every struct here mirrors, field for field, a schema that a prompt in
//! `prompts.rs` spells out literally. Change one and you must change the
//! other.

use serde::{Deserialize, Serialize};

/// The evaluation-or-general-answer union. The model picks the variant
/// via the `type` discriminator: `evaluation` when the user's text reads
/// like an interview answer, `general_answer` for anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoachReply {
    Evaluation {
        feedback: String,
        /// 0–10 rating. Optional: older model revisions omit it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f32>,
        suggested_answer: String,
    },
    GeneralAnswer {
        response: String,
    },
}

impl CoachReply {
    /// Shape validation beyond what serde guarantees: the discriminator
    /// alone is not enough, the payload fields must carry actual text.
    pub fn is_well_formed(&self) -> bool {
        match self {
            CoachReply::Evaluation {
                feedback,
                suggested_answer,
                ..
            } => !feedback.trim().is_empty() && !suggested_answer.trim().is_empty(),
            CoachReply::GeneralAnswer { response } => !response.trim().is_empty(),
        }
    }

    /// Predetermined reply returned when the model's output cannot be
    /// recovered. Keeps the coaching flow responsive: the user always
    /// gets encouragement, never a parse error.
    pub fn fallback() -> Self {
        CoachReply::Evaluation {
            feedback: "Thanks for sharing your answer! You clearly put thought into it. \
                       Focus on structuring your response with a concrete example and a \
                       short takeaway, and it will land even better."
                .to_string(),
            score: None,
            suggested_answer: "Try framing your answer as: the situation you faced, the \
                               action you took, and the result it produced. Close with one \
                               sentence on what you learned."
                .to_string(),
        }
    }
}

/// Structured profile extracted from raw CV text.
/// Every field defaults to empty: the model occasionally drops optional
/// sub-fields and a partially-filled profile is still useful downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    #[serde(default)]
    pub extracted_role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: String,
    #[serde(default)]
    pub experience_summary: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub learning_path: LearningPath,
    #[serde(default)]
    pub recommended_tasks: Vec<String>,
}

/// Upskilling plan bucketed by horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default)]
    pub immediate: Vec<String>,
    #[serde(default)]
    pub short_term: Vec<String>,
    #[serde(default)]
    pub long_term: Vec<String>,
}
