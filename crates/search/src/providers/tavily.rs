//! Tavily provider: concise, AI-oriented results.
//!
//! API: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::provider::{
    build_http_client, classify_status, classify_transport_error, ProviderSettings, SearchProvider,
};
use crate::types::{ProviderError, Reference, SearchOutcome};
use serde::{Deserialize, Serialize};

pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com";
const NAME: &str = "Tavily";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
    include_answer: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

/// Concise search backed by the Tavily API.
pub struct TavilyProvider {
    settings: ProviderSettings,
    http: Result<reqwest::Client, ProviderError>,
}

impl TavilyProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        let http = build_http_client(NAME, settings.timeout_secs);
        Self { settings, http }
    }

    fn parse_response(&self, response: TavilyResponse) -> Vec<Reference> {
        response
            .results
            .into_iter()
            .take(self.settings.max_results)
            .map(|r| Reference::from_parts(r.title.as_deref(), r.url.as_deref(), r.content.as_deref()))
            .collect()
    }

    async fn fetch(&self, query: &str) -> SearchOutcome {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config(NAME, "API key is not set"))?;
        let http = self.http.as_ref().map_err(|e| e.clone())?;

        let body = TavilyRequest {
            query,
            max_results: self.settings.max_results,
            search_depth: "basic",
            include_answer: false,
        };

        let response = http
            .post(format!("{}/search", self.settings.endpoint))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport_error(NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(NAME, status, &body));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::unknown(NAME, format!("failed to parse response: {}", e)))?;

        Ok(self.parse_response(parsed))
    }
}

#[async_trait::async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        tracing::debug!("Searching Tavily for query: {}", query);

        let outcome = self.fetch(query).await;
        match &outcome {
            Ok(references) => tracing::debug!("Tavily returned {} references", references.len()),
            Err(e) => tracing::error!(kind = ?e.kind(), "Tavily search failed: {}", e),
        }
        outcome
    }
}
