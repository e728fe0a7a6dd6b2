//! Rubric grading through a JSON-constrained chat completion.
//!
//! The provider is asked for `{grade, score, breakdown, summary}` and the reply
//! is validated against that shape before it reaches the caller:
//!
//! - `grade` and `score` are required
//! - `breakdown` defaults to empty, `summary` to an empty string
//! - numeric values are accepted and kept as their decimal text
//! - unknown keys are ignored

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{MISSING_OPENAI_KEY, classify_chat_error};
use crate::config::GraderConfig;
use crate::domain::GradeReport;
use crate::error::StageError;
use crate::llm::{ChatBackend, ChatMessage, ChatRequest, ResponseFormat};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that grades assignments. Always return valid JSON.";

/// Grade `text` against `rubric`.
pub fn grade_text(
    config: &GraderConfig,
    backend: &dyn ChatBackend,
    text: &str,
    rubric: &str,
) -> Result<GradeReport, StageError> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        return Err(StageError::MissingCredentials(MISSING_OPENAI_KEY.to_string()));
    };

    let request = ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(grading_prompt(text, rubric)),
        ],
        response_format: ResponseFormat::JsonObject,
    };

    info!(model = %config.model, text_chars = text.chars().count(), "requesting grade");
    let content = backend
        .complete(api_key, &request)
        .map_err(|e| classify_chat_error(e, "Grading failed"))?;

    let report = parse_grade(&content).map_err(|reason| {
        warn!(%reason, "grade response failed validation");
        StageError::MalformedResponse(format!("Grading failed: {reason}"))
    })?;

    info!(
        grade = %report.grade,
        score = %report.score,
        criteria = report.breakdown.len(),
        "grade received"
    );
    Ok(report)
}

pub fn grading_prompt(text: &str, rubric: &str) -> String {
    format!(
        r#"You are an AI grader. Grade the following assignment based on the rubric provided.

Rubric:
{rubric}

Assignment:
{text}

Return the response in valid JSON format with the following structure:
{{
    "grade": "Letter Grade (e.g., A, B+)",
    "score": "Numeric Score (e.g., 85/100)",
    "breakdown": {{
        "criteria_name": "score/max"
    }},
    "summary": "Brief summary of the grading"
}}"#
    )
}

/// Validate the provider's JSON reply.
pub fn parse_grade(content: &str) -> Result<GradeReport, String> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| format!("response is not valid JSON ({e})"))?;
    let Value::Object(mut obj) = value else {
        return Err("response is not a JSON object".to_string());
    };

    let grade = required_text(&mut obj, "grade")?;
    let score = required_text(&mut obj, "score")?;
    let breakdown = match obj.remove("breakdown") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(entries)) => entries
            .into_iter()
            .map(|(criterion, v)| {
                scalar_text(v)
                    .map(|s| (criterion.clone(), s))
                    .ok_or_else(|| {
                        format!("breakdown entry `{criterion}` is not a string or number")
                    })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err("`breakdown` is not an object".to_string()),
    };
    let summary = match obj.remove("summary") {
        None | Some(Value::Null) => String::new(),
        Some(v) => scalar_text(v).ok_or("`summary` is not a string")?,
    };

    if !obj.is_empty() {
        debug!(keys = ?obj.keys().collect::<Vec<_>>(), "ignoring extra grade keys");
    }

    Ok(GradeReport {
        grade,
        score,
        breakdown,
        summary,
    })
}

fn required_text(obj: &mut Map<String, Value>, key: &str) -> Result<String, String> {
    match obj.remove(key) {
        None | Some(Value::Null) => Err(format!("missing key `{key}`")),
        Some(v) => scalar_text(v).ok_or_else(|| format!("`{key}` is not a string or number")),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::llm::ChatError;
    use crate::llm::stub::StubChat;

    fn config_with_key() -> GraderConfig {
        GraderConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..GraderConfig::default()
        }
    }

    #[test]
    fn missing_key_short_circuits() {
        let backend = StubChat::replying("{}");
        let err = grade_text(&GraderConfig::default(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err, StageError::MissingCredentials("OpenAI API key missing".to_string()));
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn grade_passes_through_without_key_changes() {
        let reply =
            r#"{"grade":"A","score":"95/100","breakdown":{"Content":"38/40"},"summary":"Good"}"#;
        let backend = StubChat::replying(reply);

        let report =
            grade_text(&config_with_key(), &backend, "The sky is blue.", "Be accurate.").unwrap();
        assert_eq!(
            report,
            GradeReport {
                grade: "A".to_string(),
                score: "95/100".to_string(),
                breakdown: IndexMap::from([("Content".to_string(), "38/40".to_string())]),
                summary: "Good".to_string(),
            }
        );
        let round_trip: Value = serde_json::to_value(&report).unwrap();
        assert_eq!(round_trip, serde_json::from_str::<Value>(reply).unwrap());
    }

    #[test]
    fn request_is_json_constrained_and_embeds_inputs() {
        let backend = StubChat::replying(r#"{"grade":"B","score":"80/100"}"#);
        grade_text(&config_with_key(), &backend, "ESSAY BODY", "RUBRIC BODY").unwrap();

        let requests = backend.requests.borrow();
        let req = &requests[0];
        assert_eq!(req.model, "gpt-3.5-turbo");
        assert_eq!(req.response_format, ResponseFormat::JsonObject);
        assert_eq!(req.messages[0].role, "system");
        assert!(req.messages[1].content.contains("ESSAY BODY"));
        assert!(req.messages[1].content.contains("RUBRIC BODY"));
    }

    #[test]
    fn invalid_json_is_a_typed_failure() {
        let backend = StubChat::replying("Sure! Here's the grade: A");
        let err = grade_text(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedResponse);
        assert!(err.to_string().contains("Grading failed"));
    }

    #[test]
    fn schema_mismatch_is_a_typed_failure() {
        let backend = StubChat::replying(r#"{"score":"90/100"}"#);
        let err = grade_text(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(
            err,
            StageError::MalformedResponse("Grading failed: missing key `grade`".to_string())
        );
    }

    #[test]
    fn quota_failure_is_distinct() {
        let backend = StubChat::failing(ChatError::Api {
            status: Some(429),
            code: Some("insufficient_quota".to_string()),
            kind: None,
            message: "You exceeded your current quota".to_string(),
        });
        let err = grade_text(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err, StageError::QuotaExceeded);
    }

    #[test]
    fn other_upstream_failures_carry_the_cause() {
        let backend = StubChat::failing(ChatError::Transport("connection refused".to_string()));
        let err = grade_text(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UpstreamFailed);
        assert_eq!(err.to_string(), "Grading failed: request failed: connection refused");
    }

    #[test]
    fn numbers_are_coerced_and_optional_fields_default() {
        let report =
            parse_grade(r#"{"grade":"B+","score":87,"breakdown":{"Analysis":27},"extra":true}"#)
                .unwrap();
        assert_eq!(report.score, "87");
        assert_eq!(report.breakdown.get("Analysis").map(String::as_str), Some("27"));
        assert_eq!(report.summary, "");

        let minimal = parse_grade(r#"{"grade":"C","score":"70/100"}"#).unwrap();
        assert!(minimal.breakdown.is_empty());
    }

    #[test]
    fn breakdown_keeps_provider_order() {
        let reply = r#"{"grade":"B","score":"82/100",
            "breakdown":{"Structure":"17/20","Content":"34/40","Analysis":"24/30"}}"#;
        let report = parse_grade(reply).unwrap();
        let criteria: Vec<&str> = report.breakdown.keys().map(String::as_str).collect();
        assert_eq!(criteria, ["Structure", "Content", "Analysis"]);

        let out = serde_json::to_string(&report.breakdown).unwrap();
        assert_eq!(out, r#"{"Structure":"17/20","Content":"34/40","Analysis":"24/30"}"#);
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(parse_grade("[1, 2]").is_err());
        assert!(parse_grade(r#"{"grade":"A","score":"9","breakdown":"all good"}"#).is_err());
        assert!(parse_grade(r#"{"grade":["A"],"score":"9"}"#).is_err());
        assert!(parse_grade(r#"{"grade":"A","score":"9","breakdown":{"x":{"y":1}}}"#).is_err());
    }
}
