//! Web reference retrieval for refchat.
//!
//! Two providers are wired in: SerpApi for detailed Google results and
//! Tavily for concise ones. Provider failures never escape as errors; they
//! become visible placeholder references so an answer can still be shown.
//!
//! # Example
//! ```no_run
//! use refchat_core::config::SearchSettings;
//! use refchat_search::ReferenceRouter;
//!
//! # async fn example() {
//! let router = ReferenceRouter::from_settings(&SearchSettings::default());
//! let markdown = router.route("Plan a 3-day trip to Rome").await;
//! println!("{}", markdown);
//! # }
//! ```

pub mod aggregate;
pub mod provider;
pub mod providers;
pub mod route;
pub mod types;

pub use aggregate::{dedupe_references, outcome_records, render_references, Aggregator};
pub use provider::{ProviderSettings, SearchProvider};
pub use providers::{SerpApiProvider, StaticProvider, TavilyProvider};
pub use route::{render_outcome, ReferenceRouter, RouteTag};
pub use types::{
    ProviderError, ProviderErrorKind, Reference, SearchOutcome, NO_REFERENCES,
    NO_REFERENCES_FOR_QUERY,
};
