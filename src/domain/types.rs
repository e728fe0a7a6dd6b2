//! Shared domain types.
//!
//! These values are ephemeral: each is produced by one stage for one request and
//! then displayed or exported. They are serializable so the tool surface and the
//! JSON export can emit them directly.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Rubric the interactive interface starts with.
pub const DEFAULT_RUBRIC: &str = "\
Content (40%): The assignment should demonstrate a through understanding of the topic.
Structure (20%): The assignment should be well-organized with a clear introduction, body, and conclusion.
Analysis (30%): The assignment should include critical analysis backed by evidence.
Grammar & Style (10%): The assignment should be free of grammatical errors and use appropriate academic tone.";

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Pdf, DocumentKind::Docx];

    /// Resolve the kind from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }
}

/// Presentation band for a similarity percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityBand {
    High,
    Moderate,
    Low,
}

impl SimilarityBand {
    /// `> 70` is high, `> 40` is moderate, anything else is low.
    pub fn classify(score: u8) -> Self {
        if score > 70 {
            SimilarityBand::High
        } else if score > 40 {
            SimilarityBand::Moderate
        } else {
            SimilarityBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SimilarityBand::High => "High",
            SimilarityBand::Moderate => "Moderate",
            SimilarityBand::Low => "Low",
        }
    }
}

/// One search result scored against the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityMatch {
    pub url: String,
    pub score: u8,
}

impl SimilarityMatch {
    pub fn band(&self) -> SimilarityBand {
        SimilarityBand::classify(self.score)
    }
}

/// URL → similarity percentage, kept in search-rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityReport {
    matches: Vec<SimilarityMatch>,
}

impl SimilarityReport {
    /// Record a score for `url`. A repeated URL keeps its first position and
    /// takes the latest score.
    pub fn insert(&mut self, url: impl Into<String>, score: u8) {
        let url = url.into();
        match self.matches.iter_mut().find(|m| m.url == url) {
            Some(existing) => existing.score = score,
            None => self.matches.push(SimilarityMatch { url, score }),
        }
    }

    pub fn matches(&self) -> &[SimilarityMatch] {
        &self.matches
    }

    pub fn get(&self, url: &str) -> Option<u8> {
        self.matches.iter().find(|m| m.url == url).map(|m| m.score)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Highest score across all matches, if any.
    pub fn max_score(&self) -> Option<u8> {
        self.matches.iter().map(|m| m.score).max()
    }
}

impl Serialize for SimilarityReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.matches.len()))?;
        for m in &self.matches {
            map.serialize_entry(&m.url, &m.score)?;
        }
        map.end()
    }
}

/// Validated grade returned by the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeReport {
    pub grade: String,
    pub score: String,
    #[serde(default)]
    /// Criterion → score, in the order the provider listed them.
    pub breakdown: IndexMap<String, String>,
    #[serde(default)]
    pub summary: String,
}

/// Markdown feedback returned by the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Feedback(pub String);

impl Feedback {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whitespace-separated word count, as shown after extraction.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}
