//! Multi-backend aggregation: concurrent fan-out, dedupe, rank.
//!
//! Queries the selected backends concurrently, concatenates their results
//! in backend order, keeps the first result seen for each canonical URL,
//! truncates to the requested maximum, and numbers the survivors 1..N.
//! A failing backend contributes nothing; it never fails the search.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::WebConfig;
use crate::engine::SearchEngineTrait;
use crate::engines::{DuckDuckGoEngine, SearxngEngine};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::types::{SearchQuery, SearchResult};

use super::canonical::canonicalize;

/// Fans one query out to named backends and merges their results.
#[derive(Clone)]
pub struct Aggregator {
    engines: Vec<Arc<dyn SearchEngineTrait>>,
    default_order: Vec<String>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("engines", &self.engine_names())
            .field("default_order", &self.default_order)
            .finish()
    }
}

impl Aggregator {
    /// Aggregator over `engines`, consulting `default_order` when a query
    /// names no backends.
    pub fn new(engines: Vec<Arc<dyn SearchEngineTrait>>, default_order: Vec<String>) -> Self {
        Self {
            engines,
            default_order,
        }
    }

    /// The built-in SearXNG and DuckDuckGo backends sharing `fetcher`.
    pub fn from_config(config: &WebConfig, fetcher: Fetcher) -> Self {
        let engines: Vec<Arc<dyn SearchEngineTrait>> = vec![
            Arc::new(SearxngEngine::new(config, fetcher.clone())),
            Arc::new(DuckDuckGoEngine::new(config, fetcher)),
        ];
        Self::new(engines, config.engine_order.clone())
    }

    /// Names of all registered backends.
    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    fn engine(&self, name: &str) -> Option<&Arc<dyn SearchEngineTrait>> {
        self.engines
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// Backends to consult for `requested`, in order, each at most once.
    fn plan(&self, requested: &[String]) -> Vec<Arc<dyn SearchEngineTrait>> {
        let order = if requested.iter().any(|n| !n.trim().is_empty()) {
            requested
        } else {
            self.default_order.as_slice()
        };

        let mut seen = HashSet::new();
        let mut planned = Vec::new();
        for name in order.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            match self.engine(name) {
                Some(engine) => {
                    if seen.insert(engine.name().to_string()) {
                        planned.push(Arc::clone(engine));
                    }
                }
                None => tracing::warn!(engine = name, "unknown search engine skipped"),
            }
        }
        planned
    }

    /// Search every selected backend concurrently and merge the results.
    ///
    /// # Pipeline
    ///
    /// 1. Resolve the backend list (query's, else the default order)
    /// 2. Fan out with [`futures::future::join_all`]; failures become empty
    /// 3. Concatenate in backend order, independent of completion order
    /// 4. Dedupe by canonical URL, first seen wins
    /// 5. Truncate to `query.max_results` and rank 1..N
    ///
    /// # Errors
    ///
    /// Returns [`crate::WebError::InvalidQuery`] only if the query itself is
    /// invalid. Backend failures are logged and never surface.
    pub async fn aggregate(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        query.validate()?;

        let planned = self.plan(&query.engines);
        if planned.is_empty() {
            tracing::debug!("no search engines selected");
            return Ok(Vec::new());
        }

        let futures: Vec<_> = planned.iter().map(|engine| engine.search(query)).collect();
        let batches = futures::future::join_all(futures).await;

        for (engine, batch) in planned.iter().zip(&batches) {
            tracing::debug!(engine = engine.name(), count = batch.len(), "engine returned results");
        }

        let merged = merge_ranked(batches, query.max_results);
        tracing::debug!(count = merged.len(), "aggregated results");
        Ok(merged)
    }
}

/// Concatenate `batches`, drop later duplicates by canonical URL, keep at
/// most `max_results`, and assign dense ranks starting at 1.
pub fn merge_ranked(batches: Vec<Vec<SearchResult>>, max_results: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for result in batches.into_iter().flatten() {
        if merged.len() >= max_results {
            break;
        }
        if seen.insert(canonicalize(&result.url)) {
            merged.push(result);
        }
    }

    for (i, result) in merged.iter_mut().enumerate() {
        result.rank = i + 1;
    }
    merged
}
