//! Text-generation backends.
//!
//! Grading and feedback each make a single chat-completion call. The seam is
//! [`ChatBackend`]; [`OpenAiClient`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint.

use serde::Serialize;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiClient;

/// Error code the provider uses when the account has no remaining quota.
pub const INSUFFICIENT_QUOTA: &str = "insufficient_quota";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Output constraint for a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// One non-streaming chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned {}: {}", status_label(.status), .message)]
    Api {
        status: Option<u16>,
        code: Option<String>,
        kind: Option<String>,
        message: String,
    },

    #[error("provider returned no completion")]
    EmptyResponse,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ChatError {
    /// Whether the failure means the account is out of quota.
    ///
    /// Prefers the provider's structured error code. The substring check on
    /// the message is a fallback for providers that only report free text.
    pub fn is_quota(&self) -> bool {
        if let ChatError::Api { code, kind, .. } = self {
            let structured = [code, kind]
                .into_iter()
                .flatten()
                .any(|v| v == INSUFFICIENT_QUOTA);
            if structured {
                return true;
            }
        }
        self.to_string().to_lowercase().contains("quota")
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "an error".to_string(),
    }
}

pub trait ChatBackend {
    /// Run a completion and return the first choice's message content.
    fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ChatError>;
}
