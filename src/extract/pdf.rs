//! PDF page text.

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use super::ExtractError;

/// Extract the text of every page, concatenated in page order.
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let doc = Document::load(path)?;

    // `get_pages` is keyed by 1-based page number, so iteration is page order.
    let pages = doc.get_pages();
    debug!(pages = pages.len(), "loaded PDF");

    let mut text = String::new();
    for &page_number in pages.keys() {
        text.push_str(&doc.extract_text(&[page_number])?);
    }
    Ok(text)
}
