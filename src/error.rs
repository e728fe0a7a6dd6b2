use serde::Serialize;
use thiserror::Error;

/// Exit code for usage, input and configuration problems.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for failures reported by a pipeline stage or the terminal.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<StageError> for AppError {
    fn from(err: StageError) -> Self {
        let exit_code = match err.code() {
            ErrorCode::MissingCredentials | ErrorCode::UnsupportedFormat => EXIT_USAGE,
            _ => EXIT_RUNTIME,
        };
        AppError::new(exit_code, err.sentinel())
    }
}

/// Stable, machine-readable category of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingCredentials,
    UnsupportedFormat,
    ExtractionFailed,
    UpstreamFailed,
    QuotaExceeded,
    MalformedResponse,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingCredentials => "missing_credentials",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::ExtractionFailed => "extraction_failed",
            ErrorCode::UpstreamFailed => "upstream_failed",
            ErrorCode::QuotaExceeded => "quota_exceeded",
            ErrorCode::MalformedResponse => "malformed_response",
        }
    }
}

/// Failure of a single pipeline stage.
///
/// Every stage returns `Result<_, StageError>`; nothing past a stage boundary
/// panics or bubbles a lower-level error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("{0}")]
    MissingCredentials(String),

    #[error("Unsupported file format. Please upload PDF or DOCX.")]
    UnsupportedFormat { extension: Option<String> },

    #[error("Failed to parse file: {0}")]
    Extraction(String),

    #[error("{0}")]
    Upstream(String),

    #[error("OpenAI API quota exceeded. Please check your billing details.")]
    QuotaExceeded,

    #[error("{0}")]
    MalformedResponse(String),
}

impl StageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StageError::MissingCredentials(_) => ErrorCode::MissingCredentials,
            StageError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            StageError::Extraction(_) => ErrorCode::ExtractionFailed,
            StageError::Upstream(_) => ErrorCode::UpstreamFailed,
            StageError::QuotaExceeded => ErrorCode::QuotaExceeded,
            StageError::MalformedResponse(_) => ErrorCode::MalformedResponse,
        }
    }

    /// Legacy string form: the message prefixed with `Error: `.
    ///
    /// Only the named-tool surface and terminal banners use this; in-process
    /// callers branch on the variant.
    pub fn sentinel(&self) -> String {
        format!("Error: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_always_starts_with_error_marker() {
        let errors = [
            StageError::MissingCredentials("OpenAI API key missing".to_string()),
            StageError::UnsupportedFormat { extension: Some("txt".to_string()) },
            StageError::Extraction("invalid zip header".to_string()),
            StageError::Upstream("Grading failed: timeout".to_string()),
            StageError::QuotaExceeded,
            StageError::MalformedResponse("Grading failed: missing key `grade`".to_string()),
        ];
        for err in errors {
            assert!(err.sentinel().starts_with("Error"), "{}", err.sentinel());
        }
    }

    #[test]
    fn quota_message_mentions_billing() {
        let err = StageError::QuotaExceeded;
        assert_eq!(err.code(), ErrorCode::QuotaExceeded);
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn stage_errors_map_to_exit_codes() {
        let usage: AppError = StageError::UnsupportedFormat { extension: None }.into();
        assert_eq!(usage.exit_code(), EXIT_USAGE);

        let runtime: AppError = StageError::Upstream("boom".to_string()).into();
        assert_eq!(runtime.exit_code(), EXIT_RUNTIME);
        assert_eq!(runtime.to_string(), "Error: boom");
    }

    #[test]
    fn error_codes_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorCode::QuotaExceeded).unwrap();
        assert_eq!(json, "\"quota_exceeded\"");
        assert_eq!(ErrorCode::ExtractionFailed.as_str(), "extraction_failed");
    }
}
