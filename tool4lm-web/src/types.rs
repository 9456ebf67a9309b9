//! Core types for search queries, search results, and fetched pages.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WebError;
use crate::fetch::FetchResult;

/// Result count used when a query does not specify one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// A single logical search, fanned out to one or more backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text. Must not be blank.
    pub text: String,
    /// Maximum results returned after merging.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Language hint; backends fall back to the configured default.
    #[serde(default)]
    pub lang: Option<String>,
    /// Restrict results to this site.
    #[serde(default)]
    pub site: Option<String>,
    /// Backends to consult, in order. Empty uses the configured order.
    #[serde(default)]
    pub engines: Vec<String>,
}

impl SearchQuery {
    /// Query with default options.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_results: DEFAULT_MAX_RESULTS,
            lang: None,
            site: None,
            engines: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    #[must_use]
    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    /// Checks that the text is not blank and `max_results` is positive.
    pub fn validate(&self) -> Result<(), WebError> {
        if self.text.trim().is_empty() {
            return Err(WebError::InvalidQuery("query text must not be empty".into()));
        }
        if self.max_results == 0 {
            return Err(WebError::InvalidQuery(
                "max_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Text sent to backends, with a `site:` operator when restricted.
    pub fn backend_text(&self) -> String {
        match self.site.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(site) => format!("site:{site} {}", self.text.trim()),
            None => self.text.trim().to_owned(),
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the search result page.
    pub title: String,
    /// The URL as the backend returned it.
    pub url: String,
    /// A text snippet summarising the page content. May be empty.
    pub snippet: String,
    /// Name of the backend that produced this result.
    pub source: String,
    /// 1-based position. Provisional per backend until the aggregator
    /// assigns the final dense ranking.
    pub rank: usize,
}

/// A hyperlink found in extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Extracted readable content from a web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// The URL the HTML came from.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Lower-cased `lang` attribute of the root element, or empty.
    pub lang: String,
    /// Cleaned, readable text content with HTML boilerplate stripped.
    pub text: String,
    /// Number of words in the extracted text.
    pub word_count: usize,
    /// Anchors with an `href`, resolved against `url` when possible.
    pub links: Vec<Link>,
    /// `<meta name|property=... content=...>` pairs.
    pub meta: BTreeMap<String, String>,
}

/// Whether a content type should be surfaced as text.
///
/// `text/*`, and anything mentioning html, xml, or json.
pub fn is_text_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("text/") || ct.contains("html") || ct.contains("xml") || ct.contains("json")
}

/// A fetched resource shaped for callers.
///
/// Exactly one of `body_text` and `body_bytes_base64` is set when a body
/// was read; both are `None` when the upstream returned an error status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedPage {
    pub final_url: String,
    pub status: u16,
    pub content_type: String,
    pub body_text: Option<String>,
    pub body_bytes_base64: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Shape a [`FetchResult`], decoding text-like bodies as UTF-8 and
    /// base64-encoding everything else.
    pub fn from_result(result: FetchResult) -> Self {
        let (body_text, body_bytes_base64) = match result.body {
            Some(bytes) if is_text_content_type(&result.content_type) => {
                (Some(String::from_utf8_lossy(&bytes).into_owned()), None)
            }
            Some(bytes) => (
                None,
                Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            ),
            None => (None, None),
        };
        Self {
            final_url: result.final_url,
            status: result.status,
            content_type: result.content_type,
            body_text,
            body_bytes_base64,
            fetched_at: Utc::now(),
        }
    }
}
