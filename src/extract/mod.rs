//! Document text extraction.
//!
//! - PDF: text of every page, in page order (`pdf`)
//! - DOCX: body paragraphs joined with `\n` (`docx`)
//!
//! The extension decides the format; an unrecognized extension is rejected
//! before the file is touched.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::DocumentKind;
use crate::error::StageError;

pub mod docx;
pub mod pdf;

pub use docx::{extract_docx_text, read_docx};
pub use pdf::extract_pdf_text;

/// Low-level extraction failure, before it is folded into a [`StageError`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("invalid DOCX container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid DOCX markup: {0}")]
    Xml(String),

    #[error("DOCX is missing its main document part ({0})")]
    MissingPart(&'static str),
}

/// Extract plain text from a PDF or DOCX file.
pub fn extract_text(path: &Path) -> Result<String, StageError> {
    let Some(kind) = DocumentKind::from_path(path) else {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string);
        debug!(path = %path.display(), ?extension, "rejecting unsupported document");
        return Err(StageError::UnsupportedFormat { extension });
    };

    info!(path = %path.display(), kind = kind.extension(), "extracting document text");
    let result = match kind {
        DocumentKind::Pdf => extract_pdf_text(path),
        DocumentKind::Docx => extract_docx_text(path),
    };

    match result {
        Ok(text) => {
            info!(chars = text.chars().count(), "extraction finished");
            Ok(text)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "extraction failed");
            Err(StageError::Extraction(err.to_string()))
        }
    }
}
