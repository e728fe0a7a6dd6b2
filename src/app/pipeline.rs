//! Shared grading pipeline used by the CLI, the tool surface and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! extract -> (optional) similarity check -> grade -> feedback
//!
//! Front-ends only decide how to present the outcomes.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::GraderConfig;
use crate::domain::{Feedback, GradeReport, SimilarityReport, word_count};
use crate::error::{AppError, EXIT_RUNTIME, StageError};
use crate::llm::{ChatBackend, OpenAiClient};
use crate::search::{GoogleSearchClient, SearchBackend};

/// The four operations bound to one configuration and one pair of backends.
pub struct Grader {
    config: GraderConfig,
    search: Box<dyn SearchBackend>,
    chat: Box<dyn ChatBackend>,
}

impl Grader {
    /// Build a grader that talks to the configured HTTP providers.
    pub fn from_config(config: GraderConfig) -> Result<Self, AppError> {
        let search = GoogleSearchClient::new(config.timeout)
            .map_err(|e| AppError::new(EXIT_RUNTIME, e.to_string()))?
            .with_base_url(config.search_url.clone());
        let chat = OpenAiClient::new(config.timeout)
            .map_err(|e| AppError::new(EXIT_RUNTIME, e.to_string()))?
            .with_base_url(config.openai_base_url.clone());
        Ok(Self::with_backends(config, Box::new(search), Box::new(chat)))
    }

    pub fn with_backends(
        config: GraderConfig,
        search: Box<dyn SearchBackend>,
        chat: Box<dyn ChatBackend>,
    ) -> Self {
        Self { config, search, chat }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    pub fn parse_file(&self, path: &Path) -> Result<String, StageError> {
        crate::extract::extract_text(path)
    }

    pub fn check_plagiarism(&self, text: &str) -> Result<SimilarityReport, StageError> {
        crate::stages::check_plagiarism(&self.config, self.search.as_ref(), text)
    }

    pub fn grade_text(&self, text: &str, rubric: &str) -> Result<GradeReport, StageError> {
        crate::stages::grade_text(&self.config, self.chat.as_ref(), text, rubric)
    }

    pub fn generate_feedback(&self, text: &str, rubric: &str) -> Result<Feedback, StageError> {
        crate::stages::generate_feedback(&self.config, self.chat.as_ref(), text, rubric)
    }
}

/// Text pulled out of an uploaded document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub text: String,
}

impl ExtractedDocument {
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

/// What happened to the optional similarity check.
#[derive(Debug, Clone)]
pub enum SimilarityOutcome {
    /// The caller did not ask for a similarity check.
    Disabled,
    /// A check was requested but search credentials are not configured.
    SkippedMissingCredentials,
    Ran(Result<SimilarityReport, StageError>),
}

/// Outcomes of the network-backed stages for one document.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub similarity: SimilarityOutcome,
    pub grade: Result<GradeReport, StageError>,
    pub feedback: Result<Feedback, StageError>,
}

impl Assessment {
    /// True when at least one of grading or feedback produced a result.
    pub fn any_succeeded(&self) -> bool {
        self.grade.is_ok() || self.feedback.is_ok()
    }
}

/// All computed outputs of a single `grader run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub document: ExtractedDocument,
    pub rubric: String,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub check_plagiarism: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { check_plagiarism: true }
    }
}

/// Extract a document's text. A failure here stops the pipeline.
pub fn extract_document(grader: &Grader, path: &Path) -> Result<ExtractedDocument, StageError> {
    let text = grader.parse_file(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ExtractedDocument {
        path: path.to_path_buf(),
        file_name,
        text,
    })
}

/// Run the similarity check (if requested and configured), then grading, then
/// feedback.
///
/// Without a generation key nothing runs. A missing search configuration only
/// skips the similarity check. Grading and feedback run independently of each
/// other's outcome.
pub fn assess(
    grader: &Grader,
    text: &str,
    rubric: &str,
    options: RunOptions,
) -> Result<Assessment, StageError> {
    if !grader.config().has_generation_key() {
        return Err(StageError::MissingCredentials(
            crate::stages::MISSING_OPENAI_KEY.to_string(),
        ));
    }

    let similarity = if !options.check_plagiarism {
        SimilarityOutcome::Disabled
    } else if !grader.config().has_search_credentials() {
        warn!("skipping plagiarism check: Google API key or search engine id missing");
        SimilarityOutcome::SkippedMissingCredentials
    } else {
        SimilarityOutcome::Ran(grader.check_plagiarism(text))
    };

    let grade = grader.grade_text(text, rubric);
    let feedback = grader.generate_feedback(text, rubric);

    let assessment = Assessment {
        similarity,
        grade,
        feedback,
    };
    info!(
        grade_ok = assessment.grade.is_ok(),
        feedback_ok = assessment.feedback.is_ok(),
        "assessment finished"
    );
    Ok(assessment)
}

/// Execute the full pipeline for one file.
pub fn run_pipeline(
    grader: &Grader,
    path: &Path,
    rubric: &str,
    options: RunOptions,
) -> Result<RunOutput, StageError> {
    let document = extract_document(grader, path)?;
    info!(file = %document.file_name, words = document.word_count(), "document processed");

    let assessment = assess(grader, &document.text, rubric, options)?;
    Ok(RunOutput {
        document,
        rubric: rubric.to_string(),
        assessment,
    })
}
