//! Backend location.
//!
//! The base URL comes from, in order: an explicit override (the `--api-url`
//! flag), `PUBSUMMARY_API_URL`, the legacy `API_URL`, and finally the local
//! loopback default.

use crate::error::{PubSummaryError, Result, ResultExt};
use tracing::debug;
use url::Url;

/// Default backend location when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Environment variables consulted for the base URL, highest priority first
pub const API_URL_ENV_VARS: &[&str] = &["PUBSUMMARY_API_URL", "API_URL"];

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, always ending in `/`
    pub api_url: Url,
}

impl Config {
    /// Build a config from a base URL string.
    pub fn new(api_url: &str) -> Result<Self> {
        Ok(Self {
            api_url: parse_base_url(api_url)?,
        })
    }

    /// Resolve the config from an optional override and the process environment.
    pub fn resolve(override_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(override_url, |key| std::env::var(key).ok())
    }

    /// Like [`Config::resolve`], reading variables through `lookup`.
    pub fn resolve_with<F>(override_url: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
            debug!(api_url = url, "Using API URL from command line");
            return Self::new(url);
        }

        for &key in API_URL_ENV_VARS {
            if let Some(url) = lookup(key).filter(|u| !u.trim().is_empty()) {
                debug!(api_url = %url, env = key, "Using API URL from environment");
                return Self::new(&url);
            }
        }

        Self::new(DEFAULT_API_URL)
    }

    /// URL of the search/upload endpoint (`<base>/`)
    pub fn search_url(&self) -> Url {
        self.api_url.clone()
    }

    /// URL of the export endpoint (`<base>/download?format=..`)
    pub fn download_url(&self, format: &str) -> Result<Url> {
        let mut url = self
            .api_url
            .join("download")
            .or_config("Invalid download URL")?;
        url.query_pairs_mut().append_pair("format", format);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{}/", trimmed)).or_config("Invalid API URL")?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(PubSummaryError::Config(format!(
            "API URL must be an http(s) URL: {}",
            raw
        )));
    }
    Ok(url)
}
