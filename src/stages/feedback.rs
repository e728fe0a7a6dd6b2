//! Narrative Markdown feedback.

use tracing::info;

use super::{MISSING_OPENAI_KEY, classify_chat_error};
use crate::config::GraderConfig;
use crate::domain::Feedback;
use crate::error::StageError;
use crate::llm::{ChatBackend, ChatMessage, ChatRequest, ResponseFormat};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that provides educational feedback.";

/// Ask for detailed, constructive feedback on `text` against `rubric`.
pub fn generate_feedback(
    config: &GraderConfig,
    backend: &dyn ChatBackend,
    text: &str,
    rubric: &str,
) -> Result<Feedback, StageError> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        return Err(StageError::MissingCredentials(MISSING_OPENAI_KEY.to_string()));
    };

    let request = ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(feedback_prompt(text, rubric)),
        ],
        response_format: ResponseFormat::Text,
    };

    info!(model = %config.model, "requesting feedback");
    let content = backend
        .complete(api_key, &request)
        .map_err(|e| classify_chat_error(e, "Feedback generation failed"))?;

    info!(chars = content.chars().count(), "feedback received");
    Ok(Feedback(content))
}

pub fn feedback_prompt(text: &str, rubric: &str) -> String {
    format!(
        "Provide detailed, constructive feedback for this assignment based on the rubric.

Rubric:
{rubric}

Assignment:
{text}

Format the output in Markdown."
    )
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
        let backend = StubChat::replying("unused");
        let err =
            generate_feedback(&GraderConfig::default(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingCredentials);
        assert_eq!(err.sentinel(), "Error: OpenAI API key missing");
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn returns_markdown_verbatim() {
        let backend = StubChat::replying("## Strengths\n- Clear thesis");
        let feedback = generate_feedback(&config_with_key(), &backend, "text", "rubric").unwrap();
        assert_eq!(feedback.as_str(), "## Strengths\n- Clear thesis");

        let requests = backend.requests.borrow();
        assert_eq!(requests[0].response_format, ResponseFormat::Text);
        assert!(requests[0].messages[1].content.contains("Markdown"));
    }

    #[test]
    fn quota_text_in_error_maps_to_billing_message() {
        let backend = StubChat::failing(ChatError::Transport(
            "Error code: 429 - You exceeded your current Quota".to_string(),
        ));
        let err = generate_feedback(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err, StageError::QuotaExceeded);
        let sentinel = err.sentinel();
        assert!(sentinel.starts_with("Error"));
        assert!(sentinel.contains("billing"));
    }

    #[test]
    fn generic_failure_message() {
        let backend = StubChat::failing(ChatError::EmptyResponse);
        let err = generate_feedback(&config_with_key(), &backend, "text", "rubric").unwrap_err();
        assert_eq!(err.to_string(), "Feedback generation failed: provider returned no completion");
        assert!(err.sentinel().starts_with("Error"));
    }
}
