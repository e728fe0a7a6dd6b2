//! The three network-backed pipeline stages.
//!
//! Each stage takes the configuration and its backend explicitly, checks its
//! credentials before touching the network, and returns a [`StageError`] on
//! every failure path.

use tracing::warn;

use crate::error::StageError;
use crate::llm::ChatError;

pub mod feedback;
pub mod grade;
pub mod plagiarism;

pub use feedback::generate_feedback;
pub use grade::grade_text;
pub use plagiarism::check_plagiarism;

pub(crate) const MISSING_OPENAI_KEY: &str = "OpenAI API key missing";

/// Fold a chat failure into a stage error, singling out quota exhaustion.
pub(crate) fn classify_chat_error(err: ChatError, context: &str) -> StageError {
    if err.is_quota() {
        warn!(error = %err, "generation quota exceeded");
        return StageError::QuotaExceeded;
    }
    warn!(error = %err, "{context}");
    StageError::Upstream(format!("{context}: {err}"))
}
