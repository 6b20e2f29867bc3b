//! All LLM prompt constants and builders for the coaching tasks.
//!
//! Builders are pure: typed fields in, complete prompt string out. Each
//! prompt embeds the literal output schema and an only-this-shape
//! instruction; the extractor in `extract.rs` depends on those contracts.

/// Shared instruction that forbids prose around structured output.
const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only. \
Do NOT include any text outside the JSON. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

/// Coach-reply prompt template. Replace `{user_text}` before sending.
const COACH_REPLY_TEMPLATE: &str = r#"You are an experienced interview coach.

Decide which case applies to the user's message below:

CASE 1 — the message reads like an answer to an interview question
(e.g. "My biggest weakness is...", a STAR story, a self-introduction).
Return a JSON object with this EXACT schema:
{
  "type": "evaluation",
  "feedback": "Specific, encouraging feedback on the answer's content and delivery",
  "score": 7,
  "suggested_answer": "A stronger model answer the candidate could give"
}
"score" is an integer from 0 to 10.

CASE 2 — anything else (a question about interviews, careers, or small talk).
Return a JSON object with this EXACT schema:
{
  "type": "general_answer",
  "response": "A helpful, friendly reply"
}

{json_only}

USER MESSAGE:
{user_text}"#;

/// CV analysis prompt template.
/// Replace `{cv_text}`, `{role}`, `{organization}` before sending.
const CV_ANALYSIS_TEMPLATE: &str = r#"You are an expert career advisor. Analyze the CV below for a candidate targeting the role "{role}" at "{organization}".

Return a JSON object with this EXACT schema (no extra fields):
{
  "extracted_role": "The candidate's current or most recent role",
  "skills": ["skill", "skill"],
  "experience_years": "4",
  "experience_summary": "One paragraph summarizing the candidate's experience",
  "education": "Highest or most relevant education",
  "strengths": ["strength relative to the target role"],
  "weaknesses": ["gap relative to the target role"],
  "learning_path": {
    "immediate": ["what to learn this month"],
    "short_term": ["what to learn this quarter"],
    "long_term": ["what to learn this year"]
  },
  "recommended_tasks": ["concrete practice task"]
}

{json_only}

CV TEXT:
{cv_text}"#;

/// CV generation prompt template — Markdown output, deliberately NOT JSON.
/// Replace `{role}`, `{skills}`, `{experience}`, `{education}`,
/// `{achievements}` before sending.
const CV_GENERATION_TEMPLATE: &str = r#"You are a professional resume writer. Write a complete, polished CV in Markdown for the candidate described below.

Structure: name placeholder, a short professional summary, a Skills section, an Experience section, an Education section, and an Achievements section when achievements are provided.

Respond with the Markdown document ONLY. Do not wrap it in code fences. Do not add commentary before or after it.

TARGET ROLE: {role}
SKILLS: {skills}
EXPERIENCE: {experience}
EDUCATION: {education}
ACHIEVEMENTS: {achievements}"#;

/// Interview-question generation prompt template.
/// Replace `{field}`, `{role}`, `{skills}` before sending.
const QUESTION_TEMPLATE: &str = r#"You are an interviewer preparing a screening call for a candidate in the field "{field}"{role_clause}.
Candidate's listed skills: {skills}

Generate 9 interview questions: 3 about the candidate's background, 3 situational/behavioral, and 3 technical.

Return a JSON array of strings. Every string MUST begin with exactly one category tag — [Background], [Situation], or [Technical] — followed by a space and the question. Example:
[
  "[Background] Walk me through your most recent project.",
  "[Situation] Tell me about a time a deadline slipped. What did you do?",
  "[Technical] How would you design a rate limiter?"
]

{json_only}"#;

/// Substitutes every placeholder in a single left-to-right pass.
/// Substituted values are never rescanned, so user-supplied text that
/// happens to contain another placeholder token stays literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Builds the evaluation-or-general-answer prompt for free-form user text.
/// Also used for voice answers after transcription.
pub fn coach_reply_prompt(user_text: &str) -> String {
    fill(
        COACH_REPLY_TEMPLATE,
        &[
            ("{json_only}", JSON_ONLY_INSTRUCTION),
            ("{user_text}", user_text),
        ],
    )
}

/// Builds the CV analysis prompt. Empty role/organization render as
/// generic targets rather than empty quotes.
pub fn cv_analysis_prompt(cv_text: &str, role: &str, organization: &str) -> String {
    let role = if role.trim().is_empty() {
        "a role matching the CV"
    } else {
        role
    };
    let organization = if organization.trim().is_empty() {
        "a typical employer in the field"
    } else {
        organization
    };
    fill(
        CV_ANALYSIS_TEMPLATE,
        &[
            ("{json_only}", JSON_ONLY_INSTRUCTION),
            ("{role}", role),
            ("{organization}", organization),
            ("{cv_text}", cv_text),
        ],
    )
}

/// Builds the Markdown CV generation prompt.
pub fn cv_generation_prompt(
    role: &str,
    skills: &[String],
    experience: &str,
    education: &str,
    achievements: &[String],
) -> String {
    let achievements = if achievements.is_empty() {
        "none provided".to_string()
    } else {
        achievements.join("; ")
    };
    fill(
        CV_GENERATION_TEMPLATE,
        &[
            ("{role}", role),
            ("{skills}", &skills.join(", ")),
            ("{experience}", experience),
            ("{education}", education),
            ("{achievements}", &achievements),
        ],
    )
}

/// Builds the tagged-question generation prompt.
pub fn question_prompt(field: &str, role: &str, skills: &[String]) -> String {
    let role_clause = if role.trim().is_empty() {
        String::new()
    } else {
        format!(" applying for the role \"{role}\"")
    };
    let skills = if skills.is_empty() {
        "not provided".to_string()
    } else {
        skills.join(", ")
    };
    fill(
        QUESTION_TEMPLATE,
        &[
            ("{json_only}", JSON_ONLY_INSTRUCTION),
            ("{role_clause}", &role_clause),
            ("{field}", field),
            ("{skills}", &skills),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coach_reply_prompt_embeds_user_text_and_schema() {
        let prompt = coach_reply_prompt("My biggest weakness is public speaking.");
        assert!(prompt.contains("My biggest weakness is public speaking."));
        assert!(prompt.contains("\"type\": \"evaluation\""));
        assert!(prompt.contains("\"type\": \"general_answer\""));
        assert!(prompt.contains("valid JSON only"));
        assert!(!prompt.contains("{user_text}"));
    }

    #[test]
    fn test_cv_analysis_prompt_fills_all_placeholders() {
        let prompt = cv_analysis_prompt("CV BODY", "ML Engineer", "Acme");
        assert!(prompt.contains("CV BODY"));
        assert!(prompt.contains("\"ML Engineer\""));
        assert!(prompt.contains("\"Acme\""));
        assert!(prompt.contains("learning_path"));
        assert!(!prompt.contains("{cv_text}"));
        assert!(!prompt.contains("{role}"));
    }

    #[test]
    fn test_cv_analysis_prompt_defaults_blank_targets() {
        let prompt = cv_analysis_prompt("CV BODY", "", "  ");
        assert!(prompt.contains("a role matching the CV"));
        assert!(prompt.contains("a typical employer in the field"));
    }

    #[test]
    fn test_cv_generation_prompt_is_markdown_not_json() {
        let prompt = cv_generation_prompt(
            "Data Scientist",
            &["Python".to_string(), "SQL".to_string()],
            "3 years of analytics work",
            "MSc Statistics",
            &[],
        );
        assert!(prompt.contains("Markdown"));
        assert!(prompt.contains("Python, SQL"));
        assert!(prompt.contains("none provided"));
        assert!(!prompt.contains("JSON object"));
    }

    #[test]
    fn test_question_prompt_lists_all_three_tags() {
        let prompt = question_prompt(
            "Data Science",
            "ML Engineer",
            &["Python".to_string(), "SQL".to_string()],
        );
        assert!(prompt.contains("[Background]"));
        assert!(prompt.contains("[Situation]"));
        assert!(prompt.contains("[Technical]"));
        assert!(prompt.contains("\"ML Engineer\""));
        assert!(prompt.contains("Python, SQL"));
    }

    #[test]
    fn test_question_prompt_omits_role_clause_when_blank() {
        let prompt = question_prompt("Data Science", "", &[]);
        assert!(!prompt.contains("applying for the role"));
        assert!(prompt.contains("not provided"));
    }

    #[test]
    fn test_user_field_containing_placeholder_token_stays_literal() {
        // A role of "{cv_text}" must not get re-substituted with the CV
        // body during filling.
        let prompt = cv_analysis_prompt("CV BODY", "{cv_text}", "Acme");
        assert_eq!(prompt.matches("CV BODY").count(), 1);
        assert!(prompt.contains("\"{cv_text}\""));
    }

    #[test]
    fn test_fill_substitutes_earliest_placeholder_first() {
        let out = fill("a={a} b={b}", &[("{b}", "2"), ("{a}", "1")]);
        assert_eq!(out, "a=1 b=2");
    }

    /// Builders are pure: identical inputs, identical prompt.
    #[test]
    fn test_builders_are_deterministic() {
        let a = coach_reply_prompt("same input");
        let b = coach_reply_prompt("same input");
        assert_eq!(a, b);
    }
}
