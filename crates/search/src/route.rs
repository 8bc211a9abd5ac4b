//! Keyword routing of a query to search providers.

use crate::aggregate::{outcome_records, render_references, Aggregator};
use crate::provider::{ProviderSettings, SearchProvider};
use crate::providers::{SerpApiProvider, TavilyProvider, SERPAPI_ENDPOINT, TAVILY_ENDPOINT};
use crate::types::{SearchOutcome, NO_REFERENCES};
use refchat_core::config::SearchSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which references a query gets in simplified mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTag {
    /// Comparisons: detailed provider only.
    Compare,
    /// Trip planning: both providers, merged.
    Itinerary,
    /// Everything else: concise provider only.
    Default,
}

impl RouteTag {
    /// Classify a query by case-insensitive substring.
    ///
    /// Comparison cues are checked before planning cues, so
    /// "plan vs book" is a comparison.
    pub fn classify(query: &str) -> Self {
        let lower = query.to_lowercase();
        if lower.contains("compare") || lower.contains("vs") {
            Self::Compare
        } else if lower.contains("itinerary") || lower.contains("plan") {
            Self::Itinerary
        } else {
            Self::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compare => "compare",
            Self::Itinerary => "itinerary",
            Self::Default => "default",
        }
    }
}

/// Render a single provider's outcome for a routed query.
pub fn render_outcome(outcome: SearchOutcome) -> String {
    let records = outcome_records(outcome);
    if records.is_empty() {
        return NO_REFERENCES.to_string();
    }
    render_references(&records)
}

/// Owns both providers and picks references for a query.
#[derive(Clone)]
pub struct ReferenceRouter {
    aggregator: Aggregator,
}

impl ReferenceRouter {
    pub fn new(detailed: Arc<dyn SearchProvider>, concise: Arc<dyn SearchProvider>) -> Self {
        Self {
            aggregator: Aggregator::new(detailed, concise),
        }
    }

    /// SerpApi as the detailed provider and Tavily as the concise one.
    ///
    /// API keys are read once here; a missing key surfaces on first search.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        let detailed = SerpApiProvider::new(ProviderSettings::resolve(
            &settings.serpapi,
            SERPAPI_ENDPOINT,
            settings.max_results,
        ));
        let concise = TavilyProvider::new(ProviderSettings::resolve(
            &settings.tavily,
            TAVILY_ENDPOINT,
            settings.max_results,
        ));
        Self::new(Arc::new(detailed), Arc::new(concise))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// References for `query` chosen by its [`RouteTag`].
    pub async fn route(&self, query: &str) -> String {
        let tag = RouteTag::classify(query);
        tracing::debug!(route = tag.as_str(), "Routing references for query");

        match tag {
            RouteTag::Compare => render_outcome(self.aggregator.detailed().search(query).await),
            RouteTag::Itinerary => self.aggregator.combine(query).await,
            RouteTag::Default => render_outcome(self.aggregator.concise().search(query).await),
        }
    }
}
