//! Canned search provider for tests and offline runs.

use crate::provider::SearchProvider;
use crate::types::{ProviderError, Reference, SearchOutcome};
use std::sync::Mutex;

/// A provider that returns the same outcome for every query and records
/// the queries it received.
#[derive(Debug)]
pub struct StaticProvider {
    name: String,
    outcome: SearchOutcome,
    queries: Mutex<Vec<String>>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, outcome: SearchOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(name: impl Into<String>, references: Vec<Reference>) -> Self {
        Self::new(name, Ok(references))
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Ok(Vec::new()))
    }

    pub fn failing(name: impl Into<String>, error: ProviderError) -> Self {
        Self::new(name, Err(error))
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries().len()
    }
}

#[async_trait::async_trait]
impl SearchProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> SearchOutcome {
        tracing::debug!("Searching {} for query: {}", self.name, query);
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.to_string());
        self.outcome.clone()
    }
}
