//! SerpApi provider: detailed Google results.
//!
//! API: https://serpapi.com/search-api

use crate::provider::{
    build_http_client, classify_status, classify_transport_error, ProviderSettings, SearchProvider,
};
use crate::types::{ProviderError, Reference, SearchOutcome};
use serde::Deserialize;

pub const SERPAPI_ENDPOINT: &str = "https://serpapi.com";
const NAME: &str = "SerpApi";

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// Detailed search backed by SerpApi's Google engine.
pub struct SerpApiProvider {
    settings: ProviderSettings,
    http: Result<reqwest::Client, ProviderError>,
}

impl SerpApiProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        let http = build_http_client(NAME, settings.timeout_secs);
        Self { settings, http }
    }

    fn parse_response(&self, response: SerpApiResponse) -> SearchOutcome {
        if response.organic_results.is_empty() {
            // SerpApi reports some credential problems in the body with a 200.
            if let Some(error) = response.error {
                if error.to_lowercase().contains("api key") {
                    return Err(ProviderError::config(NAME, error));
                }
                tracing::debug!("SerpApi returned no results: {}", error);
            }
            return Ok(Vec::new());
        }

        Ok(response
            .organic_results
            .into_iter()
            .take(self.settings.max_results)
            .map(|r| {
                Reference::from_parts(r.title.as_deref(), r.link.as_deref(), r.snippet.as_deref())
            })
            .collect())
    }

    async fn fetch(&self, query: &str) -> SearchOutcome {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::config(NAME, "API key is not set"))?;
        let http = self.http.as_ref().map_err(|e| e.clone())?;

        let num = self.settings.max_results.to_string();
        let response = http
            .get(format!("{}/search.json", self.settings.endpoint))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", api_key),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| classify_transport_error(NAME, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(NAME, status, &body));
        }

        let parsed: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::unknown(NAME, format!("failed to parse response: {}", e)))?;

        self.parse_response(parsed)
    }
}

#[async_trait::async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        tracing::debug!("Searching SerpApi for query: {}", query);

        let outcome = self.fetch(query).await;
        match &outcome {
            Ok(references) => tracing::debug!("SerpApi returned {} references", references.len()),
            Err(e) => tracing::error!(kind = ?e.kind(), "SerpApi search failed: {}", e),
        }
        outcome
    }
}
