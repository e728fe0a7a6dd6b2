//! Runtime configuration.
//!
//! Credentials and knobs travel as an explicit [`GraderConfig`] value. The
//! binary builds one from the environment (plus an optional `.env`) and CLI
//! overrides; library callers can construct it directly.

use std::time::Duration;

use crate::error::{AppError, EXIT_USAGE};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_QUERY_CHARS: usize = 100;
pub const DEFAULT_COMPARE_CHARS: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Search-provider credentials. Both parts are required for a similarity check.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

impl std::fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("api_key", &"<redacted>")
            .field("engine_id", &"<redacted>")
            .finish()
    }
}

/// Excerpt lengths used by the similarity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityOptions {
    /// Leading characters of the document used as the search query.
    pub query_chars: usize,
    /// Leading characters of the document compared against each snippet.
    pub compare_chars: usize,
}

impl Default for SimilarityOptions {
    fn default() -> Self {
        Self {
            query_chars: DEFAULT_QUERY_CHARS,
            compare_chars: DEFAULT_COMPARE_CHARS,
        }
    }
}

#[derive(Clone)]
pub struct GraderConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub google_api_key: Option<String>,
    pub google_cx: Option<String>,
    pub search_url: String,
    pub similarity: SimilarityOptions,
    pub timeout: Duration,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            google_api_key: None,
            google_cx: None,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            similarity: SimilarityOptions::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderConfig")
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("google_api_key", &redacted(&self.google_api_key))
            .field("google_cx", &redacted(&self.google_cx))
            .field("search_url", &self.search_url)
            .field("similarity", &self.similarity)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GraderConfig {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let similarity = SimilarityOptions {
            query_chars: parse_var(&get, "GRADER_QUERY_CHARS")?.unwrap_or(DEFAULT_QUERY_CHARS),
            compare_chars: parse_var(&get, "GRADER_COMPARE_CHARS")?
                .unwrap_or(DEFAULT_COMPARE_CHARS),
        };
        let timeout_secs: u64 =
            parse_var(&get, "GRADER_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            google_api_key: get("GOOGLE_API_KEY"),
            google_cx: get("GOOGLE_CX"),
            search_url: defaults.search_url,
            similarity,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Search credentials, if both the key and the engine id are configured.
    pub fn search_credentials(&self) -> Option<SearchCredentials> {
        match (&self.google_api_key, &self.google_cx) {
            (Some(api_key), Some(engine_id)) => Some(SearchCredentials {
                api_key: api_key.clone(),
                engine_id: engine_id.clone(),
            }),
            _ => None,
        }
    }

    pub fn has_search_credentials(&self) -> bool {
        self.google_api_key.is_some() && self.google_cx.is_some()
    }

    pub fn has_generation_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Invalid {key} '{raw}': {e}"))),
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() { "<redacted>" } else { "<unset>" }
}
