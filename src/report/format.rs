//! Terminal formatting for grading results.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays free of presentation concerns
//! - output changes are localized

use crate::app::pipeline::{Assessment, ExtractedDocument, RunOutput, SimilarityOutcome};
use crate::domain::{Feedback, GradeReport, SimilarityBand, SimilarityReport, preview};
use crate::error::StageError;

/// Characters of extracted text shown in previews.
pub const PREVIEW_CHARS: usize = 1000;

const MAX_URL_WIDTH: usize = 96;

/// Document header: name, word count and a text preview.
pub fn format_document_summary(document: &ExtractedDocument) -> String {
    let mut out = String::new();
    out.push_str("=== grader - Assignment Report ===\n");
    out.push_str(&format!("File: {}\n", document.file_name));
    out.push_str(&format!("Word count: {}\n", document.word_count()));
    out.push_str("\nPreview:\n");
    out.push_str(&preview(&document.text, PREVIEW_CHARS));
    out.push('\n');
    out
}

pub fn format_grade(report: &GradeReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Grade: {} ({})\n", report.grade, report.score));

    if !report.breakdown.is_empty() {
        out.push_str("\nBreakdown:\n");
        let width = report.breakdown.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (criterion, score) in &report.breakdown {
            out.push_str(&format!("  {criterion:<width$}  {score}\n"));
        }
    }

    if !report.summary.is_empty() {
        out.push_str("\nSummary:\n");
        out.push_str(&report.summary);
        out.push('\n');
    }
    out
}

pub fn format_feedback(feedback: &Feedback) -> String {
    let mut out = String::from("Feedback:\n");
    out.push_str(feedback.as_str().trim_end());
    out.push('\n');
    out
}

/// One line per match, classified by band, in result order.
pub fn format_similarity(report: &SimilarityReport) -> String {
    if report.is_empty() {
        return "No similar content found online.\n".to_string();
    }

    let mut out = String::new();
    for m in report.matches() {
        out.push_str(&format!(
            "{} similarity ({}%): {}\n",
            m.band().label(),
            m.score,
            truncate(&m.url, MAX_URL_WIDTH)
        ));
    }
    out
}

/// Count of matches per band, high first.
pub fn band_counts(report: &SimilarityReport) -> [(SimilarityBand, usize); 3] {
    let count = |band| report.matches().iter().filter(|m| m.band() == band).count();
    [
        (SimilarityBand::High, count(SimilarityBand::High)),
        (SimilarityBand::Moderate, count(SimilarityBand::Moderate)),
        (SimilarityBand::Low, count(SimilarityBand::Low)),
    ]
}

pub fn format_error_banner(err: &StageError) -> String {
    format!("[{}] {}\n", err.code().as_str(), err.sentinel())
}

/// Every stage of an assessment, in pipeline order.
pub fn format_assessment(assessment: &Assessment) -> String {
    let mut out = String::new();

    out.push_str("--- Plagiarism check ---\n");
    match &assessment.similarity {
        SimilarityOutcome::Disabled => out.push_str("Disabled.\n"),
        SimilarityOutcome::SkippedMissingCredentials => {
            out.push_str("Skipped: Google API key or search engine id not configured.\n")
        }
        SimilarityOutcome::Ran(Ok(report)) => out.push_str(&format_similarity(report)),
        SimilarityOutcome::Ran(Err(e)) => out.push_str(&format_error_banner(e)),
    }

    out.push_str("\n--- Grade ---\n");
    match &assessment.grade {
        Ok(report) => out.push_str(&format_grade(report)),
        Err(e) => out.push_str(&format_error_banner(e)),
    }

    out.push_str("\n--- Feedback ---\n");
    match &assessment.feedback {
        Ok(feedback) => out.push_str(&format_feedback(feedback)),
        Err(e) => out.push_str(&format_error_banner(e)),
    }
    out
}

pub fn format_run(run: &RunOutput) -> String {
    let mut out = format_document_summary(&run.document);
    out.push('\n');
    out.push_str(&format_assessment(&run.assessment));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('~');
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indexmap::IndexMap;

    use super::*;

    fn sample_grade() -> GradeReport {
        GradeReport {
            grade: "B+".to_string(),
            score: "87/100".to_string(),
            breakdown: IndexMap::from([
                ("Content".to_string(), "35/40".to_string()),
                ("Organization".to_string(), "26/30".to_string()),
            ]),
            summary: "Solid work.".to_string(),
        }
    }

    #[test]
    fn grade_lists_breakdown_and_summary() {
        let text = format_grade(&sample_grade());
        assert!(text.starts_with("Grade: B+ (87/100)\n"));
        assert!(text.contains("  Content       35/40\n"));
        assert!(text.contains("  Organization  26/30\n"));
        assert!(text.ends_with("Summary:\nSolid work.\n"));
    }

    #[test]
    fn breakdown_is_printed_in_provider_order() {
        let report = GradeReport {
            breakdown: IndexMap::from([
                ("Structure".to_string(), "17/20".to_string()),
                ("Content".to_string(), "34/40".to_string()),
                ("Analysis".to_string(), "24/30".to_string()),
            ]),
            ..sample_grade()
        };
        let text = format_grade(&report);
        let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("  ")).collect();
        assert_eq!(rows, ["  Structure  17/20", "  Content    34/40", "  Analysis   24/30"]);
    }

    #[test]
    fn similarity_lines_are_classified() {
        let mut report = SimilarityReport::default();
        report.insert("https://high.example", 85);
        report.insert("https://mid.example", 55);
        report.insert("https://low.example", 40);

        let text = format_similarity(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "High similarity (85%): https://high.example",
                "Moderate similarity (55%): https://mid.example",
                "Low similarity (40%): https://low.example",
            ]
        );
        assert_eq!(
            band_counts(&report),
            [(SimilarityBand::High, 1), (SimilarityBand::Moderate, 1), (SimilarityBand::Low, 1)]
        );
    }

    #[test]
    fn empty_similarity_report_says_so() {
        assert_eq!(
            format_similarity(&SimilarityReport::default()),
            "No similar content found online.\n"
        );
    }

    #[test]
    fn assessment_renders_error_banners() {
        let assessment = Assessment {
            similarity: SimilarityOutcome::SkippedMissingCredentials,
            grade: Err(StageError::QuotaExceeded),
            feedback: Ok(Feedback("Keep going.".to_string())),
        };
        let text = format_assessment(&assessment);
        assert!(text.contains("Skipped"));
        assert!(text.contains("[quota_exceeded] Error: OpenAI API quota exceeded."));
        assert!(text.contains("Feedback:\nKeep going.\n"));
    }

    #[test]
    fn document_summary_truncates_preview() {
        let document = ExtractedDocument {
            path: PathBuf::from("essay.docx"),
            file_name: "essay.docx".to_string(),
            text: "word ".repeat(400),
        };
        let text = format_document_summary(&document);
        assert!(text.contains("File: essay.docx\n"));
        assert!(text.contains("Word count: 400\n"));
        assert!(text.trim_end().ends_with("..."));
    }

    #[test]
    fn long_urls_are_truncated() {
        let url = format!("https://example.com/{}", "a".repeat(200));
        let out = truncate(&url, MAX_URL_WIDTH);
        assert_eq!(out.chars().count(), MAX_URL_WIDTH);
        assert!(out.ends_with('~'));
    }
}
