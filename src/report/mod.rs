//! Reporting utilities: formatted terminal output for the grading pipeline.

pub mod format;

pub use format::*;
