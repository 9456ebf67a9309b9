//! Trait definition for pluggable search backends.
//!
//! Each backend (SearXNG, DuckDuckGo) implements [`SearchEngineTrait`] to
//! provide a uniform interface for querying and parsing results. The trait
//! is object safe so the aggregator can hold backends by name.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{SearchQuery, SearchResult};

/// A pluggable search backend.
///
/// Implementors translate a [`SearchQuery`] into one guarded, bounded
/// request and extract structured [`SearchResult`] values from the
/// response. Each backend handles its own:
///
/// - URL construction with query encoding
/// - endpoint choice among its mirrors
/// - response parsing
///
/// All implementations must be `Send + Sync` for concurrent backend queries.
#[async_trait]
pub trait SearchEngineTrait: Send + Sync {
    /// Stable lowercase backend name, used in `SearchResult::source` and
    /// for selecting backends by name.
    fn name(&self) -> &str;

    /// Perform a search and return parsed results, at most
    /// `query.max_results`, with provisional 1-based ranks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WebError`] if the request is blocked, fails, or the
    /// response cannot be parsed.
    async fn try_search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;

    /// Like [`try_search`](Self::try_search), but never fails: any error is
    /// logged and reported as an empty list.
    async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(engine = self.name(), error = %err, "engine query failed");
                Vec::new()
            }
        }
    }
}

/// Chooses one endpoint index out of `len` mirrors (`len > 0`).
///
/// Defaults to a uniform random pick; tests install a fixed one.
#[derive(Clone)]
pub struct MirrorPicker(Arc<dyn Fn(usize) -> usize + Send + Sync>);

impl MirrorPicker {
    pub fn new<F>(pick: F) -> Self
    where
        F: Fn(usize) -> usize + Send + Sync + 'static,
    {
        Self(Arc::new(pick))
    }

    /// Always the mirror at `index` (clamped to the list).
    pub fn fixed(index: usize) -> Self {
        Self::new(move |len| index.min(len.saturating_sub(1)))
    }

    /// Pick one of `mirrors`, or `None` if the list is empty.
    pub fn pick<'a>(&self, mirrors: &'a [String]) -> Option<&'a str> {
        if mirrors.is_empty() {
            return None;
        }
        let index = (self.0)(mirrors.len()).min(mirrors.len() - 1);
        mirrors.get(index).map(String::as_str)
    }
}

impl Default for MirrorPicker {
    fn default() -> Self {
        Self::new(|len| rand::thread_rng().gen_range(0..len.max(1)))
    }
}

impl fmt::Debug for MirrorPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MirrorPicker")
    }
}

/// Assign provisional 1-based positions in response order.
pub(crate) fn number_results(results: &mut [SearchResult]) {
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
}
