//! Web search backends.
//!
//! The similarity check only needs "run one query, give me the hits". That seam
//! is the [`SearchBackend`] trait; [`GoogleSearchClient`] is the production
//! implementation.

use thiserror::Error;

use crate::config::SearchCredentials;

pub mod google;

pub use google::GoogleSearchClient;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("search provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed search response: {0}")]
    Malformed(String),
}

pub trait SearchBackend {
    /// Run `query` and return the hits in rank order.
    fn search(
        &self,
        credentials: &SearchCredentials,
        query: &str,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
