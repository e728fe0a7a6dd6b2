//! `assignment-grader` library crate.
//!
//! The binary (`grader`) is a thin wrapper around this library so that:
//!
//! - each stage is testable without spawning processes or touching the network
//! - the same operations back the CLI, the named-tool surface and the TUI
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod llm;
pub mod logging;
pub mod report;
pub mod search;
pub mod similarity;
pub mod stages;
pub mod tools;
pub mod tui;
