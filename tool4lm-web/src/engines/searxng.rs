//! SearXNG backend over its JSON API.
//!
//! Queries one instance chosen from the configured mirrors with
//! `format=json`. No configured instances means the backend is silently
//! unavailable and contributes nothing.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::{FetchBudget, WebConfig};
use crate::engine::{number_results, MirrorPicker, SearchEngineTrait};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::{FetchRequest, Fetcher};
use crate::types::{SearchQuery, SearchResult};

/// Backend name reported in [`SearchResult::source`].
pub const NAME: &str = "searxng";

/// SearXNG JSON search backend.
#[derive(Debug, Clone)]
pub struct SearxngEngine {
    fetcher: Fetcher,
    endpoints: Vec<String>,
    lang_default: String,
    budget: FetchBudget,
    picker: MirrorPicker,
}

impl SearxngEngine {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoints: config.searxng_endpoints.clone(),
            lang_default: config.lang_default.clone(),
            budget: config.searxng_budget,
            picker: MirrorPicker::default(),
        }
    }

    /// Replace the mirror picker.
    #[must_use]
    pub fn with_picker(mut self, picker: MirrorPicker) -> Self {
        self.picker = picker;
        self
    }

    fn request_url(&self, endpoint: &str, query: &SearchQuery) -> Result<Url> {
        let lang = query
            .lang
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.lang_default.as_str());
        Url::parse_with_params(
            endpoint,
            &[
                ("q", query.backend_text().as_str()),
                ("format", "json"),
                ("language", lang),
                ("safesearch", "1"),
            ],
        )
        .map_err(|e| {
            WebError::fetch(
                FetchErrorKind::InvalidUrl,
                format!("invalid SearXNG endpoint {endpoint}: {e}"),
            )
        })
    }
}

#[async_trait]
impl SearchEngineTrait for SearxngEngine {
    fn name(&self) -> &str {
        NAME
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let Some(endpoint) = self.picker.pick(&self.endpoints) else {
            tracing::debug!("no SearXNG endpoints configured");
            return Ok(Vec::new());
        };
        tracing::trace!(query = %query.text, endpoint, "SearXNG search");

        let url = self.request_url(endpoint, query)?;
        let request = FetchRequest::with_budget(url.as_str(), self.budget)?;
        let response = self.fetcher.fetch(&request).await?;
        let body = super::require_body(NAME, response)?;

        parse_searxng_json(&body, query.max_results)
    }
}

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngHit>,
}

#[derive(Debug, Deserialize)]
struct SearxngHit {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pretty_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a SearXNG JSON response body into search results.
///
/// Hits without a URL are skipped. Extracted as a separate function for
/// testability with fixed JSON.
pub(crate) fn parse_searxng_json(body: &[u8], max_results: usize) -> Result<Vec<SearchResult>> {
    let response: SearxngResponse = serde_json::from_slice(body)
        .map_err(|e| WebError::Parse(format!("invalid SearXNG JSON: {e}")))?;

    let mut results: Vec<SearchResult> = response
        .results
        .into_iter()
        .filter_map(|hit| {
            let url = non_empty(hit.url)?;
            let title = non_empty(hit.title)
                .or_else(|| non_empty(hit.pretty_url))
                .unwrap_or_else(|| url.clone());
            let snippet = non_empty(hit.content)
                .or_else(|| non_empty(hit.snippet))
                .unwrap_or_default();
            Some(SearchResult {
                title: title.trim().to_string(),
                url,
                snippet: snippet.trim().to_string(),
                source: NAME.to_string(),
                rank: 0,
            })
        })
        .take(max_results)
        .collect();
    number_results(&mut results);

    tracing::debug!(count = results.len(), "SearXNG results parsed");
    Ok(results)
}
