//! Response extraction — recovering structured values from raw model text.
//!
//! The model is an untrusted text generator: replies arrive wrapped in
//! prose, fenced in markdown, with trailing commas, or as no JSON at all.
//! Extraction is a fixed fallback chain — fence strip, bracket-balance
//! span location, an enumerated repair pass, parse, shape validation —
//! and every failure mode is a returnable value, never a panic or a
//! propagated exception.

use tracing::warn;

use crate::coaching::models::{CoachReply, CvAnalysis};

/// Upper bound on the raw-text excerpt carried by an extraction failure.
const RAW_EXCERPT_LIMIT: usize = 500;

/// The recognized question category tags, in prompt order.
pub const QUESTION_TAGS: [&str; 3] = ["[Background]", "[Situation]", "[Technical]"];

/// A model reply that could not be parsed or validated into its expected
/// shape. Not an exception: dispatchers either surface it (questions,
/// CV analysis) or mask it with a fallback payload (coach replies).
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractFailure {
    pub reason: String,
    /// First 500 characters of the raw model text, for diagnostics.
    pub raw: String,
}

impl ExtractFailure {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            raw: truncate_excerpt(raw),
        }
    }
}

/// Which top-level JSON structure a task expects.
#[derive(Debug, Clone, Copy, PartialEq)]
enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn opener(self) -> char {
        match self {
            JsonShape::Object => '{',
            JsonShape::Array => '[',
        }
    }
}

/// Recovers the evaluation-or-general-answer shape. Total: when the
/// reply cannot be recovered or fails validation, returns the generic
/// encouraging fallback instead of an error.
pub fn extract_coach_reply(raw: &str) -> CoachReply {
    match locate_and_parse::<CoachReply>(raw, JsonShape::Object) {
        Ok(reply) if reply.is_well_formed() => reply,
        Ok(_) => {
            warn!("coach reply parsed but failed shape validation; using fallback");
            CoachReply::fallback()
        }
        Err(failure) => {
            warn!("coach reply extraction failed ({}); using fallback", failure.reason);
            CoachReply::fallback()
        }
    }
}

/// Recovers a CV analysis object. Missing fields inside a located,
/// parseable object default to empty (see `CvAnalysis`); only an
/// unlocatable or unparseable object is a failure.
pub fn extract_cv_analysis(raw: &str) -> Result<CvAnalysis, ExtractFailure> {
    locate_and_parse::<CvAnalysis>(raw, JsonShape::Object)
}

/// Recovers a tagged question list. Entries that do not start with a
/// recognized category tag are filtered out; a list that parses but
/// yields zero valid entries is an extraction failure.
pub fn extract_questions(raw: &str) -> Result<Vec<String>, ExtractFailure> {
    let parsed: Vec<String> = locate_and_parse(raw, JsonShape::Array)?;

    let total = parsed.len();
    let questions: Vec<String> = parsed
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| is_tagged_question(q))
        .collect();

    if questions.is_empty() {
        return Err(ExtractFailure::new(
            "question list contained no validly tagged entries",
            raw,
        ));
    }
    if questions.len() < total {
        warn!(
            "dropped {} untagged question(s) out of {}",
            total - questions.len(),
            total
        );
    }
    Ok(questions)
}

/// The Markdown CV shape never goes through JSON parsing: fences are
/// stripped and the rest is returned verbatim.
pub fn extract_cv_markdown(raw: &str) -> String {
    strip_code_fences(raw).trim().to_string()
}

/// True when the string's first token is one of the recognized category
/// tags and a question follows it.
pub fn is_tagged_question(text: &str) -> bool {
    QUESTION_TAGS.iter().any(|tag| {
        text.strip_prefix(tag)
            .is_some_and(|rest| !rest.trim().is_empty())
    })
}

/// Shared chain for the JSON shapes: fence strip → span location →
/// repair → parse. Prose can contain bracket pairs of its own
/// ("[tagged as requested]", "{summary}"), so a span that fails to
/// parse is skipped and the scan resumes past its opener. The loop is
/// bounded by the number of opener characters in the text.
fn locate_and_parse<T: serde::de::DeserializeOwned>(
    raw: &str,
    shape: JsonShape,
) -> Result<T, ExtractFailure> {
    let stripped = strip_code_fences(raw);

    let mut from = 0;
    let mut last_failure: Option<ExtractFailure> = None;

    while let Some((start, span)) = find_balanced_span(&stripped, shape, from) {
        let mut repaired = strip_trailing_commas(span);
        if shape == JsonShape::Array {
            // Array-of-strings replies sometimes arrive with bare newlines
            // between elements that confuse downstream consumers; normalize
            // whitespace outside string literals.
            repaired = collapse_newlines(&repaired);
        }

        match serde_json::from_str(&repaired) {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_failure = Some(ExtractFailure::new(
                    format!("JSON parse/validation error: {e}"),
                    raw,
                ));
                from = start + 1;
            }
        }
    }

    Err(last_failure.unwrap_or_else(|| {
        ExtractFailure::new(
            match shape {
                JsonShape::Object => "no balanced JSON object found in model output",
                JsonShape::Array => "no balanced JSON array found in model output",
            },
            raw,
        )
    }))
}

/// Removes markdown fence markers (```, ```json, ...) wherever they
/// appear in the text, keeping the fenced content itself — including
/// content sharing a line with the fence, as in "```json {...} ```".
fn strip_code_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }
    let mut kept: Vec<&str> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            // Drop the optional language tag glued to the opening fence,
            // then keep whatever content shares the line.
            let rest = rest
                .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
                .trim();
            let rest = rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest);
            if !rest.is_empty() {
                kept.push(rest);
            }
            continue;
        }
        // Closing fence glued to the end of a content line.
        kept.push(line.strip_suffix("```").map(str::trim_end).unwrap_or(line));
    }
    kept.join("\n")
}

/// Locates the next balanced top-level structure of the requested shape
/// at or after `from`, via bracket matching. String literals and escapes
/// are honored, so braces inside quoted text never unbalance the scan.
/// Returns the span together with its start offset so callers can
/// resume scanning past a span that turned out not to be JSON.
fn find_balanced_span(text: &str, shape: JsonShape, from: usize) -> Option<(usize, &str)> {
    let start = from + text.get(from..)?.find(shape.opener())?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some((start, &text[start..=i]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes commas that immediately precede (modulo whitespace) a closing
/// brace or bracket. Only commas outside string literals are touched.
fn strip_trailing_commas(span: &str) -> String {
    let chars: Vec<char> = span.chars().collect();
    let mut out = String::with_capacity(span.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().copied().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replaces literal newlines outside string literals with single spaces.
fn collapse_newlines(span: &str) -> String {
    let mut out = String::with_capacity(span.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in span.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// First `RAW_EXCERPT_LIMIT` characters of the raw text, respecting char
/// boundaries.
fn truncate_excerpt(raw: &str) -> String {
    raw.chars().take(RAW_EXCERPT_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_EVALUATION: &str = r#"{
        "type": "evaluation",
        "feedback": "Honest and self-aware.",
        "score": 7,
        "suggested_answer": "Pair the weakness with the step you are taking to fix it."
    }"#;

    fn expected_evaluation() -> CoachReply {
        serde_json::from_str(VALID_EVALUATION).unwrap()
    }

    // ── coach reply ─────────────────────────────────────────────────────

    #[test]
    fn test_bare_evaluation_round_trips() {
        assert_eq!(extract_coach_reply(VALID_EVALUATION), expected_evaluation());
    }

    #[test]
    fn test_evaluation_in_json_fence_round_trips() {
        let raw = format!("```json\n{VALID_EVALUATION}\n```");
        assert_eq!(extract_coach_reply(&raw), expected_evaluation());
    }

    #[test]
    fn test_evaluation_wrapped_in_prose_round_trips() {
        let raw = format!(
            "Sure! Here's my evaluation of your answer:\n\n{VALID_EVALUATION}\n\nGood luck!"
        );
        assert_eq!(extract_coach_reply(&raw), expected_evaluation());
    }

    #[test]
    fn test_evaluation_in_fence_and_prose_round_trips() {
        let raw = format!("Here you go:\n```json\n{VALID_EVALUATION}\n```\nHope this helps.");
        assert_eq!(extract_coach_reply(&raw), expected_evaluation());
    }

    #[test]
    fn test_single_line_fence_keeps_shared_content() {
        // Fence markers and JSON on one line: only the markers go.
        let raw = r#"```json {"type":"general_answer","response":"hi"} ```"#;
        assert_eq!(
            extract_coach_reply(raw),
            CoachReply::GeneralAnswer {
                response: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_closing_fence_glued_to_content_line() {
        let raw = "```json\n{\"type\":\"general_answer\",\"response\":\"hi\"}```";
        assert_eq!(
            extract_coach_reply(raw),
            CoachReply::GeneralAnswer {
                response: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_general_answer_with_trailing_comma_parses_after_repair() {
        let raw = r#"{"type":"general_answer","response":"hi",}"#;
        assert_eq!(
            extract_coach_reply(raw),
            CoachReply::GeneralAnswer {
                response: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_braces_inside_strings_do_not_unbalance_scan() {
        let raw = r#"{"type":"general_answer","response":"use {braces} and ]brackets[ freely"}"#;
        match extract_coach_reply(raw) {
            CoachReply::GeneralAnswer { response } => {
                assert_eq!(response, "use {braces} and ]brackets[ freely")
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_text_yields_fallback() {
        let reply = extract_coach_reply("I'm sorry, I can't format that as requested.");
        assert_eq!(reply, CoachReply::fallback());
    }

    #[test]
    fn test_wrong_shape_object_yields_fallback() {
        // Parses as JSON but has an unknown discriminator — a validation
        // failure, not a parse failure, same fallback.
        let reply = extract_coach_reply(r#"{"type":"critique","text":"meh"}"#);
        assert_eq!(reply, CoachReply::fallback());
    }

    #[test]
    fn test_empty_feedback_fails_validation_and_falls_back() {
        let raw = r#"{"type":"evaluation","feedback":"","suggested_answer":"x"}"#;
        assert_eq!(extract_coach_reply(raw), CoachReply::fallback());
    }

    // ── question list ───────────────────────────────────────────────────

    #[test]
    fn test_fully_tagged_question_array_preserved() {
        let raw = r#"[
            "[Background] Tell me about yourself.",
            "[Situation] Describe a conflict you resolved.",
            "[Technical] What is a hash map?"
        ]"#;
        let questions = extract_questions(raw).unwrap();
        assert_eq!(questions.len(), 3);
        assert!(questions
            .iter()
            .all(|q| QUESTION_TAGS.iter().any(|t| q.starts_with(t))));
    }

    #[test]
    fn test_untagged_entry_is_filtered_valid_ones_kept() {
        let raw = r#"["[Background] Tell me about yourself.", "What is your salary expectation?"]"#;
        let questions = extract_questions(raw).unwrap();
        assert_eq!(questions, vec!["[Background] Tell me about yourself."]);
    }

    #[test]
    fn test_all_untagged_entries_is_extraction_failure() {
        let raw = r#"["no tag here", "none here either"]"#;
        let err = extract_questions(raw).unwrap_err();
        assert!(err.reason.contains("no validly tagged"));
        assert!(err.raw.contains("no tag here"));
    }

    #[test]
    fn test_question_array_in_fence_with_prose() {
        let raw = "Here are your questions:\n```json\n[\n  \"[Technical] Explain indexes.\"\n]\n```";
        let questions = extract_questions(raw).unwrap();
        assert_eq!(questions, vec!["[Technical] Explain indexes."]);
    }

    #[test]
    fn test_question_array_after_bracketed_prose_recovered() {
        // Prose ahead of the array carries its own bracket pair; the
        // scan must skip it and land on the real JSON.
        let raw = r#"Here are your questions [tagged as requested]: ["[Background] Walk me through your CV."]"#;
        let questions = extract_questions(raw).unwrap();
        assert_eq!(questions, vec!["[Background] Walk me through your CV."]);
    }

    #[test]
    fn test_evaluation_after_braced_prose_recovered() {
        let raw = r#"Evaluation {summary}: {"type":"general_answer","response":"ok"}"#;
        assert_eq!(
            extract_coach_reply(raw),
            CoachReply::GeneralAnswer {
                response: "ok".to_string()
            }
        );
    }

    #[test]
    fn test_cv_analysis_after_braced_prose_recovered() {
        let raw = r#"Profile {v2} follows: {"extracted_role": "SRE"}"#;
        let analysis = extract_cv_analysis(raw).unwrap();
        assert_eq!(analysis.extracted_role, "SRE");
    }

    #[test]
    fn test_question_array_with_trailing_comma_parses() {
        let raw = "[\"[Background] Walk me through your CV.\",]";
        let questions = extract_questions(raw).unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn test_non_json_question_reply_is_failure_with_excerpt() {
        let err = extract_questions("1. Tell me about yourself\n2. Why us?").unwrap_err();
        assert!(err.reason.contains("no balanced JSON array"));
        assert!(err.raw.starts_with("1. Tell me about yourself"));
    }

    #[test]
    fn test_tag_must_be_first_token() {
        assert!(is_tagged_question("[Situation] Tell me about a failure."));
        assert!(!is_tagged_question("Question: [Situation] Tell me more."));
        assert!(!is_tagged_question("[Situation]"));
        assert!(!is_tagged_question("[Custom] Not a real tag."));
    }

    // ── CV analysis ─────────────────────────────────────────────────────

    #[test]
    fn test_cv_analysis_with_prose_and_missing_fields() {
        let raw = r#"Based on the CV, here is the analysis:
        {"extracted_role": "QA Engineer", "skills": ["Selenium"]}"#;
        let analysis = extract_cv_analysis(raw).unwrap();
        assert_eq!(analysis.extracted_role, "QA Engineer");
        assert!(analysis.learning_path.long_term.is_empty());
    }

    #[test]
    fn test_cv_analysis_non_json_is_failure() {
        let err = extract_cv_analysis("The CV looks solid overall.").unwrap_err();
        assert!(err.reason.contains("no balanced JSON object"));
        assert_eq!(err.raw, "The CV looks solid overall.");
    }

    #[test]
    fn test_failure_excerpt_truncated_to_500_chars() {
        let raw = "x".repeat(2000);
        let err = extract_cv_analysis(&raw).unwrap_err();
        assert_eq!(err.raw.chars().count(), 500);
    }

    #[test]
    fn test_failure_excerpt_respects_multibyte_boundaries() {
        let raw = "é".repeat(600);
        let err = extract_cv_analysis(&raw).unwrap_err();
        assert_eq!(err.raw.chars().count(), 500);
    }

    // ── markdown ────────────────────────────────────────────────────────

    #[test]
    fn test_markdown_fences_stripped_content_verbatim() {
        let raw = "```markdown\n# Jane Doe\n\n## Skills\n- Rust\n```";
        assert_eq!(extract_cv_markdown(raw), "# Jane Doe\n\n## Skills\n- Rust");
    }

    #[test]
    fn test_markdown_without_fences_untouched() {
        let raw = "# Jane Doe\n\n## Skills\n- Rust";
        assert_eq!(extract_cv_markdown(raw), raw);
    }

    #[test]
    fn test_markdown_is_never_json_parsed() {
        // A markdown doc containing JSON-looking text comes back as-is.
        let raw = "# CV\n\nConfig sample: {\"broken\": }";
        assert_eq!(extract_cv_markdown(raw), raw);
    }

    // ── repair helpers ──────────────────────────────────────────────────

    #[test]
    fn test_strip_trailing_commas_ignores_commas_in_strings() {
        let span = r#"{"a": "one, two,", "b": [1, 2,],}"#;
        let repaired = strip_trailing_commas(span);
        assert_eq!(repaired, r#"{"a": "one, two,", "b": [1, 2]}"#);
        assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
    }

    #[test]
    fn test_collapse_newlines_preserves_escaped_newlines_in_strings() {
        let span = "[\n  \"[Background] line one\\nline two\"\n]";
        let collapsed = collapse_newlines(span);
        assert!(!collapsed.contains('\n'));
        let parsed: Vec<String> = serde_json::from_str(&collapsed).unwrap();
        assert_eq!(parsed[0], "[Background] line one\nline two");
    }

    #[test]
    fn test_find_balanced_span_picks_first_structure() {
        let text = "noise {\"a\": {\"b\": 1}} trailing {\"c\": 2}";
        assert_eq!(
            find_balanced_span(text, JsonShape::Object, 0),
            Some((6, "{\"a\": {\"b\": 1}}"))
        );
    }

    #[test]
    fn test_find_balanced_span_resumes_from_offset() {
        let text = "{\"a\": 1} and {\"b\": 2}";
        let (first, _) = find_balanced_span(text, JsonShape::Object, 0).unwrap();
        let (_, second) = find_balanced_span(text, JsonShape::Object, first + 1).unwrap();
        assert_eq!(second, "{\"b\": 2}");
    }

    #[test]
    fn test_find_balanced_span_unterminated_returns_none() {
        assert_eq!(find_balanced_span("{\"a\": 1", JsonShape::Object, 0), None);
    }

    #[test]
    fn test_object_shape_skips_leading_array() {
        // Shape-dependent scan: an object request keys off '{' even when
        // an array appears earlier in the text.
        let text = "[1, 2] then {\"type\":\"general_answer\",\"response\":\"ok\"}";
        let (_, span) = find_balanced_span(text, JsonShape::Object, 0).unwrap();
        assert!(span.starts_with("{\"type\""));
    }
}
