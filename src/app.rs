//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads configuration from the environment and applies CLI overrides
//! - runs the requested stage (or the whole pipeline)
//! - prints reports and writes optional exports

use std::path::Path;
use std::time::Duration;

use clap::Parser;

use crate::cli::{
    Command, ConfigOverrides, FileArgs, ParseArgs, RubricArgs, RubricSource, RunArgs, ToolArgs,
    TuiArgs,
};
use crate::config::GraderConfig;
use crate::domain::DEFAULT_RUBRIC;
use crate::error::{AppError, EXIT_RUNTIME, EXIT_USAGE};
use crate::logging::LogTarget;

pub mod pipeline;

use pipeline::{Grader, RunOptions};

/// Entry point for the `grader` binary.
pub fn run() -> Result<(), AppError> {
    // We want `grader` and `grader --model X` to behave like `grader tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    if !matches!(cli.command, Command::Tui(_)) {
        crate::logging::init(LogTarget::Stderr)?;
    }

    let config = config_from_env(&cli.overrides)?;

    match cli.command {
        Command::Parse(args) => handle_parse(config, args),
        Command::Plagiarism(args) => handle_plagiarism(config, args),
        Command::Grade(args) => handle_grade(config, args),
        Command::Feedback(args) => handle_feedback(config, args),
        Command::Run(args) => handle_run(config, args),
        Command::Tool(args) => handle_tool(config, args),
        Command::Tui(args) => handle_tui(config, args),
    }
}

/// Environment configuration with CLI overrides applied.
pub fn config_from_env(overrides: &ConfigOverrides) -> Result<GraderConfig, AppError> {
    let mut config = GraderConfig::from_env()?;
    apply_overrides(&mut config, overrides);
    Ok(config)
}

pub fn apply_overrides(config: &mut GraderConfig, overrides: &ConfigOverrides) {
    if let Some(model) = &overrides.model {
        config.model = model.clone();
    }
    if let Some(n) = overrides.query_chars {
        config.similarity.query_chars = n;
    }
    if let Some(n) = overrides.compare_chars {
        config.similarity.compare_chars = n;
    }
    if let Some(secs) = overrides.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
}

/// Rubric text from `--rubric`, `--rubric-file`, or the built-in default.
pub fn resolve_rubric(source: &RubricSource) -> Result<String, AppError> {
    if let Some(text) = &source.rubric {
        return Ok(text.clone());
    }
    if let Some(path) = &source.rubric_file {
        return std::fs::read_to_string(path)
            .map_err(|e| {
                AppError::new(
                    EXIT_USAGE,
                    format!("Failed to read rubric '{}': {e}", path.display()),
                )
            });
    }
    Ok(DEFAULT_RUBRIC.to_string())
}

fn handle_parse(config: GraderConfig, args: ParseArgs) -> Result<(), AppError> {
    let path = match args.file {
        Some(path) => path,
        None => crate::cli::picker::prompt_for_document_path()?,
    };
    let grader = Grader::from_config(config)?;
    let text = grader.parse_file(&path)?;
    println!("{text}");
    Ok(())
}

fn handle_plagiarism(config: GraderConfig, args: FileArgs) -> Result<(), AppError> {
    let grader = Grader::from_config(config)?;
    let text = extract(&grader, &args.file)?;
    let report = grader.check_plagiarism(&text)?;
    print!("{}", crate::report::format_similarity(&report));
    Ok(())
}

fn handle_grade(config: GraderConfig, args: RubricArgs) -> Result<(), AppError> {
    let rubric = resolve_rubric(&args.rubric)?;
    let grader = Grader::from_config(config)?;
    let text = extract(&grader, &args.file)?;
    let report = grader.grade_text(&text, &rubric)?;
    print!("{}", crate::report::format_grade(&report));
    Ok(())
}

fn handle_feedback(config: GraderConfig, args: RubricArgs) -> Result<(), AppError> {
    let rubric = resolve_rubric(&args.rubric)?;
    let grader = Grader::from_config(config)?;
    let text = extract(&grader, &args.file)?;
    let feedback = grader.generate_feedback(&text, &rubric)?;
    println!("{feedback}");
    Ok(())
}

fn handle_run(config: GraderConfig, args: RunArgs) -> Result<(), AppError> {
    let rubric = resolve_rubric(&args.rubric)?;
    let grader = Grader::from_config(config)?;
    let options = RunOptions {
        check_plagiarism: !args.no_plagiarism,
    };

    let run = pipeline::run_pipeline(&grader, &args.file, &rubric, options)?;
    print!("{}", crate::report::format_run(&run));

    // Optional export.
    if let Some(path) = &args.export {
        crate::io::export::write_results_json(path, &run)?;
        println!("\nResults exported to {}", path.display());
    }

    if !run.assessment.any_succeeded() {
        return Err(AppError::new(EXIT_RUNTIME, "Grading and feedback both failed."));
    }
    Ok(())
}

fn handle_tool(config: GraderConfig, args: ToolArgs) -> Result<(), AppError> {
    let grader = Grader::from_config(config)?;
    let output = crate::tools::dispatch_str(&grader, &args.name, &args.args);
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to render tool output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn handle_tui(config: GraderConfig, args: TuiArgs) -> Result<(), AppError> {
    let target = match &args.log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Disabled,
    };
    crate::logging::init(target)?;

    let grader = Grader::from_config(config)?;
    crate::tui::run(grader)
}

fn extract(grader: &Grader, path: &Path) -> Result<String, AppError> {
    Ok(grader.parse_file(path)?)
}

const SUBCOMMANDS: [&str; 7] = ["parse", "plagiarism", "grade", "feedback", "run", "tool", "tui"];

/// Rewrite argv so `grader` defaults to `grader tui`.
///
/// Rules:
/// - `grader`                         -> `grader tui`
/// - `grader --log-file g.log`        -> `grader tui --log-file g.log`
/// - `grader --model gpt-4o run x`    -> unchanged (global flags before a subcommand)
/// - `grader --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // Only flags so far: the user is configuring the TUI unless a subcommand
    // shows up later on the line.
    let names_subcommand = argv[1..].iter().any(|a| SUBCOMMANDS.contains(&a.as_str()));
    if arg1.starts_with('-') && !names_subcommand {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["grader"])), argv(&["grader", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["grader", "--log-file", "g.log"])),
            argv(&["grader", "tui", "--log-file", "g.log"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["grader", "--help"])), argv(&["grader", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["grader", "run", "essay.pdf"])),
            argv(&["grader", "run", "essay.pdf"])
        );
    }

    #[test]
    fn global_flags_before_a_subcommand_are_untouched() {
        assert_eq!(
            rewrite_args(argv(&["grader", "--model", "gpt-4o", "run", "essay.pdf"])),
            argv(&["grader", "--model", "gpt-4o", "run", "essay.pdf"])
        );
        assert_eq!(
            rewrite_args(argv(&["grader", "--timeout-secs", "5", "tui"])),
            argv(&["grader", "--timeout-secs", "5", "tui"])
        );
        assert_eq!(
            rewrite_args(argv(&["grader", "--model", "gpt-4o"])),
            argv(&["grader", "tui", "--model", "gpt-4o"])
        );
    }

    #[test]
    fn overrides_replace_environment_values() {
        let mut config = GraderConfig::default();
        apply_overrides(
            &mut config,
            &ConfigOverrides {
                model: Some("gpt-4o-mini".to_string()),
                query_chars: Some(50),
                compare_chars: None,
                timeout_secs: Some(5),
            },
        );
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.similarity.query_chars, 50);
        assert_eq!(config.similarity.compare_chars, crate::config::DEFAULT_COMPARE_CHARS);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rubric_resolution_order() {
        assert_eq!(resolve_rubric(&RubricSource::default()).unwrap(), DEFAULT_RUBRIC);

        let inline = RubricSource {
            rubric: Some("Inline".to_string()),
            rubric_file: None,
        };
        assert_eq!(resolve_rubric(&inline).unwrap(), "Inline");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rubric.txt");
        std::fs::write(&path, "From file").unwrap();
        let from_file = RubricSource {
            rubric: None,
            rubric_file: Some(path),
        };
        assert_eq!(resolve_rubric(&from_file).unwrap(), "From file");

        let missing = RubricSource {
            rubric: None,
            rubric_file: Some(PathBuf::from("no-such-rubric.txt")),
        };
        assert_eq!(resolve_rubric(&missing).unwrap_err().exit_code(), EXIT_USAGE);
    }
}
