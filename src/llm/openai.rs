//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatBackend, ChatError, ChatMessage, ChatRequest, ResponseFormat};
use crate::config::DEFAULT_OPENAI_BASE_URL;

pub struct OpenAiClient {
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(timeout: Duration) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl ChatBackend for OpenAiClient {
    fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, ChatError> {
        let body = WireRequest::from(request);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            json = matches!(request.response_format, ResponseFormat::JsonObject),
            "sending chat completion"
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(api_error(status.as_u16(), &text));
        }

        let parsed: WireResponse = resp
            .json()
            .map_err(|e| ChatError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl<'a> From<&'a ChatRequest> for WireRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        let response_format = match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(WireResponseFormat { kind: "json_object" }),
        };
        Self {
            model: &request.model,
            messages: &request.messages,
            response_format,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<serde_json::Value>,
}

/// Classify a non-success response using the provider's error envelope.
fn api_error(status: u16, body: &str) -> ChatError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => ChatError::Api {
            status: Some(status),
            code: env.error.code.and_then(|c| match c {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            }),
            kind: env.error.kind,
            message: env.error.message,
        },
        Err(_) => ChatError::Api {
            status: Some(status),
            code: None,
            kind: None,
            message: body.trim().to_string(),
        },
    }
}
