//! Command-line parsing for the assignment grader.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from extraction and provider code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "grader", version, about = "AI assignment grader (PDF/DOCX)")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract and print the text of a PDF or DOCX file.
    Parse(ParseArgs),
    /// Search the web for the document's opening and print similarity scores.
    Plagiarism(FileArgs),
    /// Grade a document against a rubric.
    Grade(RubricArgs),
    /// Generate Markdown feedback for a document.
    Feedback(RubricArgs),
    /// Run the full pipeline: extract, check similarity, grade and give feedback.
    Run(RunArgs),
    /// Call one of the named tools with JSON arguments and print its JSON output.
    Tool(ToolArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// Overrides applied on top of the environment configuration.
#[derive(Debug, Args, Clone, Default)]
pub struct ConfigOverrides {
    /// Generation model name.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Leading characters of the document used as the search query.
    #[arg(long, global = true)]
    pub query_chars: Option<usize>,

    /// Leading characters of the document compared against search snippets.
    #[arg(long, global = true)]
    pub compare_chars: Option<usize>,

    /// HTTP timeout for provider calls, in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Document to extract. Prompts with a picker when omitted.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    /// PDF or DOCX document.
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone, Default)]
pub struct RubricSource {
    /// Rubric text. Defaults to the built-in four-criterion rubric.
    #[arg(long, conflicts_with = "rubric_file")]
    pub rubric: Option<String>,

    /// Read the rubric from a file.
    #[arg(long, value_name = "PATH")]
    pub rubric_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RubricArgs {
    /// PDF or DOCX document.
    pub file: PathBuf,

    #[command(flatten)]
    pub rubric: RubricSource,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// PDF or DOCX document.
    pub file: PathBuf,

    #[command(flatten)]
    pub rubric: RubricSource,

    /// Skip the web similarity check.
    #[arg(long)]
    pub no_plagiarism: bool,

    /// Export results to JSON.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ToolArgs {
    /// Tool name: parse_file, check_plagiarism, grade_text or generate_feedback.
    pub name: String,

    /// Tool arguments as a JSON object.
    #[arg(long, default_value = "{}")]
    pub args: String,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TuiArgs {
    /// Write logs to this file while the TUI is running.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
