//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the recognized document formats (`DocumentKind`)
//! - similarity check output (`SimilarityReport`, `SimilarityBand`)
//! - generation outputs (`GradeReport`, `Feedback`)

pub mod types;

pub use types::*;
