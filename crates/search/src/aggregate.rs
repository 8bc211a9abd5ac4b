//! Merging, deduplication and rendering of provider results.

use crate::provider::SearchProvider;
use crate::types::{Reference, SearchOutcome, NO_REFERENCES_FOR_QUERY};
use std::collections::HashSet;
use std::sync::Arc;

/// Flatten an outcome into records; a failure becomes its placeholder.
pub fn outcome_records(outcome: SearchOutcome) -> Vec<Reference> {
    match outcome {
        Ok(references) => references,
        Err(error) => vec![error.placeholder()],
    }
}

/// Keep the first record for each non-empty link, in order.
///
/// Records with an empty link are all kept.
pub fn dedupe_references<I>(records: I) -> Vec<Reference>
where
    I: IntoIterator<Item = Reference>,
{
    let mut seen_links = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.link.is_empty() || seen_links.insert(r.link.clone()))
        .collect()
}

/// Render records as markdown bullets, one per line.
pub fn render_references(records: &[Reference]) -> String {
    records
        .iter()
        .map(Reference::to_markdown)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Queries both providers and merges their results.
#[derive(Clone)]
pub struct Aggregator {
    detailed: Arc<dyn SearchProvider>,
    concise: Arc<dyn SearchProvider>,
}

impl Aggregator {
    pub fn new(detailed: Arc<dyn SearchProvider>, concise: Arc<dyn SearchProvider>) -> Self {
        Self { detailed, concise }
    }

    pub fn detailed(&self) -> &dyn SearchProvider {
        self.detailed.as_ref()
    }

    pub fn concise(&self) -> &dyn SearchProvider {
        self.concise.as_ref()
    }

    /// Detailed results then concise results, deduplicated by link.
    ///
    /// The providers are called one after the other, never concurrently.
    pub async fn collect(&self, query: &str) -> Vec<Reference> {
        let mut records = outcome_records(self.detailed.search(query).await);
        records.extend(outcome_records(self.concise.search(query).await));

        let total = records.len();
        let merged = dedupe_references(records);
        tracing::debug!(
            total,
            kept = merged.len(),
            "Merged {} and {} references",
            self.detailed.name(),
            self.concise.name()
        );
        merged
    }

    /// Markdown for the merged references, or the "none found" sentence.
    pub async fn combine(&self, query: &str) -> String {
        let merged = self.collect(query).await;
        if merged.is_empty() {
            return NO_REFERENCES_FOR_QUERY.to_string();
        }
        render_references(&merged)
    }
}
