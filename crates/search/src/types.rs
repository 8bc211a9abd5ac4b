//! Search result types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned by the aggregator when no provider produced a record.
pub const NO_REFERENCES_FOR_QUERY: &str = "No references found for the query.";

/// Returned by a single-provider route when the provider found nothing.
pub const NO_REFERENCES: &str = "No references found.";

/// A web reference returned by a search provider.
///
/// `link` identifies the reference for deduplication. An empty link is
/// allowed and never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl Reference {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }

    /// Build a reference from optional provider fields.
    ///
    /// Missing title and snippet get placeholder text. A missing link stays
    /// empty instead of becoming `"No link"`, so it renders as `[title]()`
    /// and is never merged away by link deduplication.
    pub fn from_parts(title: Option<&str>, link: Option<&str>, snippet: Option<&str>) -> Self {
        Self {
            title: title.unwrap_or("No title").to_string(),
            link: link.unwrap_or_default().trim().to_string(),
            snippet: snippet.unwrap_or("No snippet").to_string(),
        }
    }

    /// Render as a markdown bullet: `- [title](link): snippet`.
    pub fn to_markdown(&self) -> String {
        format!("- [{}]({}): {}", self.title, self.link, self.snippet)
    }
}

/// What a provider returns for a query.
///
/// `Ok(vec![])` means the provider answered with no results; `Err` means it
/// could not answer at all.
pub type SearchOutcome = Result<Vec<Reference>, ProviderError>;

/// Broad category of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderErrorKind {
    /// The service could not be reached.
    Network,
    /// Missing or rejected credential, or bad provider settings.
    Config,
    /// Anything else.
    Unknown,
}

/// A failed provider call.
///
/// The display text doubles as the snippet of the visible placeholder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Network error while fetching {provider} references: {message}")]
    Network { provider: String, message: String },

    #[error("Invalid {provider} key or configuration: {message}")]
    Config { provider: String, message: String },

    #[error("Unexpected error fetching {provider} references: {message}")]
    Unknown { provider: String, message: String },
}

impl ProviderError {
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn config(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unknown(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unknown {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Network { .. } => ProviderErrorKind::Network,
            Self::Config { .. } => ProviderErrorKind::Config,
            Self::Unknown { .. } => ProviderErrorKind::Unknown,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Network { provider, .. }
            | Self::Config { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }

    /// The record shown in place of the provider's results.
    ///
    /// Titled `Error` with an empty link, so it is never deduplicated away.
    pub fn placeholder(&self) -> Reference {
        Reference::new("Error", "", self.to_string())
    }
}
