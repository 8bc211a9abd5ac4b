//! Search provider implementations.

pub mod mock;
pub mod serpapi;
pub mod tavily;

pub use mock::StaticProvider;
pub use serpapi::{SerpApiProvider, SERPAPI_ENDPOINT};
pub use tavily::{TavilyProvider, TAVILY_ENDPOINT};
