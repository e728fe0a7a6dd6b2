//! Google Custom Search JSON API integration.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{SearchBackend, SearchError, SearchHit};
use crate::config::{DEFAULT_SEARCH_URL, SearchCredentials};

pub struct GoogleSearchClient {
    client: Client,
    base_url: String,
}

impl GoogleSearchClient {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: DEFAULT_SEARCH_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl SearchBackend for GoogleSearchClient {
    fn search(
        &self,
        credentials: &SearchCredentials,
        query: &str,
    ) -> Result<Vec<SearchHit>, SearchError> {
        debug!(
            url = %self.base_url,
            query_chars = query.chars().count(),
            "sending search request"
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", credentials.api_key.as_str()),
                ("cx", credentials.engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                message: provider_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let body: SearchResponse = resp
            .json()
            .map_err(|e| SearchError::Malformed(e.to_string()))?;

        Ok(body.into_hits())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl SearchResponse {
    /// Items without a link cannot be keyed, so they are dropped.
    fn into_hits(self) -> Vec<SearchHit> {
        self.items
            .into_iter()
            .filter_map(|item| {
                Some(SearchHit {
                    link: item.link?,
                    snippet: item.snippet.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
}
