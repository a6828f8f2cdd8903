pub mod searxng;

pub use searxng::SearxngProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One web search hit. Provider ordering is preserved downstream; no dedup
/// or re-ranking happens anywhere in this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns at most `max_results` hits for `query`. An empty or
    /// whitespace-only query yields an empty list without touching the
    /// network.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;
}
