//! Export a graded run to JSON.
//!
//! The export is meant to be easy to archive or feed into downstream scripts:
//! every stage is recorded as `{"ok": ...}`, `{"skipped": ...}` or
//! `{"error": {"code": ..., "message": ...}}`.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::app::pipeline::{RunOutput, SimilarityOutcome};
use crate::domain::{Feedback, GradeReport, SimilarityReport};
use crate::error::{AppError, EXIT_USAGE, ErrorCode, StageError};

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Ok(T),
    Skipped(String),
    Error(ErrorBody),
}

impl<T: Clone> From<&Result<T, StageError>> for StageOutcome<T> {
    fn from(result: &Result<T, StageError>) -> Self {
        match result {
            Ok(value) => StageOutcome::Ok(value.clone()),
            Err(e) => StageOutcome::Error(ErrorBody {
                code: e.code(),
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportStages {
    pub plagiarism: StageOutcome<SimilarityReport>,
    pub grade: StageOutcome<GradeReport>,
    pub feedback: StageOutcome<Feedback>,
}

/// Schema of the JSON export file.
#[derive(Debug, Clone, Serialize)]
pub struct ExportFile {
    pub tool: String,
    pub generated_at: String,
    pub file_name: String,
    pub rubric: String,
    pub word_count: usize,
    pub stages: ExportStages,
}

impl ExportFile {
    pub fn from_run(run: &RunOutput, generated_at: DateTime<Utc>) -> Self {
        let plagiarism = match &run.assessment.similarity {
            SimilarityOutcome::Disabled => StageOutcome::Skipped("disabled".to_string()),
            SimilarityOutcome::SkippedMissingCredentials => {
                StageOutcome::Skipped("missing search credentials".to_string())
            }
            SimilarityOutcome::Ran(result) => result.into(),
        };

        Self {
            tool: "grader".to_string(),
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            file_name: run.document.file_name.clone(),
            rubric: run.rubric.clone(),
            word_count: run.document.word_count(),
            stages: ExportStages {
                plagiarism,
                grade: (&run.assessment.grade).into(),
                feedback: (&run.assessment.feedback).into(),
            },
        }
    }
}

/// Write a run's results to a pretty-printed JSON file.
pub fn write_results_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let export = ExportFile::from_run(run, Utc::now());

    let file = File::create(path).map_err(|e| {
        AppError::new(
            EXIT_USAGE,
            format!("Failed to create export JSON '{}': {e}", path.display()),
        )
    })?;
    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write export JSON: {e}")))?;

    info!(path = %path.display(), "results exported");
    Ok(())
}
