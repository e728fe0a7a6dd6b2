//! Similarity check: one web search, one lexical score per hit.

use tracing::{info, warn};

use crate::config::GraderConfig;
use crate::domain::SimilarityReport;
use crate::error::StageError;
use crate::search::SearchBackend;
use crate::similarity::{leading_chars, ratio};

const MISSING_SEARCH_CONFIG: &str =
    "Google API configuration missing (GOOGLE_API_KEY or GOOGLE_CX)";

/// Search for the opening of `text` and score each snippet against it.
///
/// Fails before any network call when search credentials are not configured.
pub fn check_plagiarism(
    config: &GraderConfig,
    backend: &dyn SearchBackend,
    text: &str,
) -> Result<SimilarityReport, StageError> {
    let Some(credentials) = config.search_credentials() else {
        return Err(StageError::MissingCredentials(MISSING_SEARCH_CONFIG.to_string()));
    };

    let query = search_query(text, config.similarity.query_chars);
    info!(query_chars = query.chars().count(), "running similarity check");

    let hits = backend.search(&credentials, &query).map_err(|e| {
        warn!(error = %e, "search request failed");
        StageError::Upstream(format!("Plagiarism check failed: {e}"))
    })?;

    let excerpt = leading_chars(text, config.similarity.compare_chars);
    let mut report = SimilarityReport::default();
    for hit in hits {
        report.insert(hit.link, ratio(excerpt, &hit.snippet));
    }

    info!(matches = report.len(), max = ?report.max_score(), "similarity check finished");
    Ok(report)
}

/// The first `query_chars` characters with newlines flattened to spaces.
pub fn search_query(text: &str, query_chars: usize) -> String {
    leading_chars(text, query_chars).replace('\n', " ")
}
