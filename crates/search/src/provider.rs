//! Search provider trait and shared settings.

use crate::types::{ProviderError, SearchOutcome};
use refchat_core::config::SearchProviderConfig;
use std::time::Duration;

/// Trait for web search providers.
///
/// Implementations never return an application error: every failure is
/// folded into the outcome so the caller can still render an answer.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Display name used in logs and placeholders (e.g., "SerpApi").
    fn name(&self) -> &str;

    /// Search for `query`, returning at most the configured number of results.
    async fn search(&self, query: &str) -> SearchOutcome;
}

/// Explicit settings handed to a provider at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// API key; `None` is reported as a configuration error on first search
    pub api_key: Option<String>,

    /// Base URL of the service
    pub endpoint: String,

    /// Results to request
    pub max_results: usize,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    /// Resolve settings from config, reading the API key from the environment once.
    pub fn resolve(config: &SearchProviderConfig, default_endpoint: &str, max_results: usize) -> Self {
        Self {
            api_key: config.resolve_api_key(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| default_endpoint.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_results,
            timeout_secs: config.timeout,
        }
    }
}

/// Build the HTTP client for a provider.
pub(crate) fn build_http_client(
    provider: &str,
    timeout_secs: Option<u64>,
) -> Result<reqwest::Client, ProviderError> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| ProviderError::config(provider, format!("failed to build HTTP client: {}", e)))
}

/// Map a transport error to a provider error.
pub(crate) fn classify_transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        ProviderError::network(provider, err.to_string())
    } else if err.is_builder() {
        ProviderError::config(provider, err.to_string())
    } else {
        ProviderError::unknown(provider, err.to_string())
    }
}

/// Map a non-success HTTP status to a provider error.
pub(crate) fn classify_status(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> ProviderError {
    let message = format!("status {}: {}", status, body.trim());
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ProviderError::config(provider, message)
        }
        _ => ProviderError::unknown(provider, message),
    }
}
