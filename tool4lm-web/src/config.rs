//! Web configuration with sensible defaults.
//!
//! [`WebConfig`] is the process-wide, read-only configuration for fetching
//! and searching: engine order, endpoint mirrors, language defaults, and
//! the time/size budgets applied to every fetch. It is built once at
//! startup and shared behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WebError;

/// Default User-Agent sent on every request.
pub const DEFAULT_USER_AGENT: &str = "tool4lm/0.2";

/// Default DuckDuckGo HTML endpoint.
pub const DUCKDUCKGO_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Wikipedia base URL; `{lang}` is replaced by the language code.
pub const WIKIPEDIA_BASE: &str = "https://{lang}.wikipedia.org";

/// Crossref REST API base URL.
pub const CROSSREF_BASE: &str = "https://api.crossref.org";

/// arXiv Atom query endpoint.
pub const ARXIV_QUERY_ENDPOINT: &str = "https://export.arxiv.org/api/query";

/// Time and size budget for one backend's fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBudget {
    /// Wall-clock limit in milliseconds.
    pub timeout_ms: u64,
    /// Maximum body bytes kept.
    pub max_bytes: usize,
}

impl FetchBudget {
    pub const fn new(timeout_ms: u64, max_bytes: usize) -> Self {
        Self {
            timeout_ms,
            max_bytes,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self, label: &str) -> Result<(), WebError> {
        if self.timeout_ms == 0 {
            return Err(WebError::Config(format!(
                "{label}.timeout_ms must be greater than 0"
            )));
        }
        if self.max_bytes == 0 {
            return Err(WebError::Config(format!(
                "{label}.max_bytes must be greater than 0"
            )));
        }
        Ok(())
    }
}

/// Configuration for fetch and search operations.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Backends consulted when a query names none, in priority order.
    pub engine_order: Vec<String>,
    /// SearXNG instance URLs (e.g. `https://searx.example/search`).
    pub searxng_endpoints: Vec<String>,
    /// DuckDuckGo HTML endpoint mirrors.
    pub duckduckgo_endpoints: Vec<String>,
    /// Language used when a query carries no hint.
    pub lang_default: String,
    /// Region combined with the language for engines that take a locale.
    pub region_default: String,
    /// Default byte cap for direct fetches.
    pub max_fetch_bytes: usize,
    /// Default timeout for direct fetches, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Budget for SearXNG JSON responses.
    pub searxng_budget: FetchBudget,
    /// Budget for DuckDuckGo HTML pages.
    pub duckduckgo_budget: FetchBudget,
    /// Budget for Wikipedia and Crossref lookups.
    pub lookup_budget: FetchBudget,
    /// Wikipedia base URL template containing `{lang}`.
    pub wikipedia_base: String,
    /// Crossref API base URL.
    pub crossref_base: String,
    /// arXiv Atom query endpoint.
    pub arxiv_endpoint: String,
    /// Budget for arXiv feeds.
    pub arxiv_budget: FetchBudget,
    /// Maximum redirect hops followed per fetch. Zero rejects any redirect.
    pub max_redirects: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            engine_order: vec!["searxng".into(), "duckduckgo".into()],
            searxng_endpoints: Vec::new(),
            duckduckgo_endpoints: vec![DUCKDUCKGO_HTML_ENDPOINT.into()],
            lang_default: "vi".into(),
            region_default: "vn".into(),
            max_fetch_bytes: 5 * 1024 * 1024,
            fetch_timeout_ms: 12_000,
            searxng_budget: FetchBudget::new(8_000, 1024 * 1024),
            duckduckgo_budget: FetchBudget::new(8_000, 512 * 1024),
            lookup_budget: FetchBudget::new(8_000, 1024 * 1024),
            wikipedia_base: WIKIPEDIA_BASE.into(),
            crossref_base: CROSSREF_BASE.into(),
            arxiv_endpoint: ARXIV_QUERY_ENDPOINT.into(),
            arxiv_budget: FetchBudget::new(10_000, 1024 * 1024),
            max_redirects: 3,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl WebConfig {
    /// Default budget for direct fetches.
    pub fn fetch_budget(&self) -> FetchBudget {
        FetchBudget::new(self.fetch_timeout_ms, self.max_fetch_bytes)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - every timeout and byte cap is greater than 0
    /// - `engine_order` is not empty
    /// - `duckduckgo_endpoints` is not empty
    /// - `user_agent` is not blank
    /// - `wikipedia_base` contains the `{lang}` placeholder
    pub fn validate(&self) -> Result<(), WebError> {
        self.fetch_budget().validate("fetch")?;
        self.searxng_budget.validate("searxng_budget")?;
        self.duckduckgo_budget.validate("duckduckgo_budget")?;
        self.lookup_budget.validate("lookup_budget")?;
        self.arxiv_budget.validate("arxiv_budget")?;
        if self.engine_order.iter().all(|e| e.trim().is_empty()) {
            return Err(WebError::Config(
                "at least one engine must be in engine_order".into(),
            ));
        }
        if self.duckduckgo_endpoints.is_empty() {
            return Err(WebError::Config(
                "duckduckgo_endpoints must not be empty".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(WebError::Config("user_agent must not be empty".into()));
        }
        if !self.wikipedia_base.contains("{lang}") {
            return Err(WebError::Config(
                "wikipedia_base must contain {lang}".into(),
            ));
        }
        Ok(())
    }
}
