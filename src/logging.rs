//! Logging setup.
//!
//! Events go to stderr for the command-line subcommands. The TUI owns the
//! terminal, so it logs to a file when one is given and otherwise not at all.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, EXIT_USAGE};

const DEFAULT_FILTER: &str = "warn";

/// Where log events should be written.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Disabled,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Calling this twice is harmless.
pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    match target {
        LogTarget::Disabled => {}
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::new(
                        EXIT_USAGE,
                        format!("Failed to open log file '{}': {e}", path.display()),
                    )
                })?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
    }
    Ok(())
}
