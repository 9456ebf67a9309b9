//! # tool4lm-web
//!
//! Guarded web retrieval and multi-backend search for tool4lm.
//!
//! This crate fetches arbitrary remote resources under strict address,
//! size, and time limits, and fans a single search query out to several
//! backends concurrently, merging their answers into one ranked list.
//!
//! ## Design
//!
//! - [`guard::AddressGuard`] rejects private, loopback, and link-local
//!   targets before any connection, and every connection is pinned to the
//!   addresses it vetted
//! - [`fetch::Fetcher`] performs one bounded GET with manual, re-vetted
//!   redirects and a single wall-clock timeout
//! - [`engines`] adapt SearXNG (JSON) and DuckDuckGo (HTML) to one shape
//! - [`orchestrator::Aggregator`] runs backends concurrently, tolerates
//!   failures, dedupes by canonical URL, and ranks 1..N
//! - Wikipedia, Crossref and arXiv lookups, and readable-content extraction
//!
//! ## Security
//!
//! - No caller headers are forwarded; the User-Agent is fixed
//! - Search queries are logged only at trace level
//! - No retries and no caching across calls

pub mod arxiv;
pub mod config;
pub mod content;
pub mod engine;
pub mod engines;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod orchestrator;
pub mod scholar;
pub mod types;
pub mod wiki;

pub use config::{FetchBudget, WebConfig};
pub use engine::{MirrorPicker, SearchEngineTrait};
pub use error::{FetchErrorKind, Result, WebError};
pub use fetch::{FetchRequest, FetchResult, Fetcher};
pub use guard::AddressGuard;
pub use orchestrator::Aggregator;
pub use types::{FetchedPage, Link, PageContent, SearchQuery, SearchResult};

/// Fetch `request` and shape the outcome for callers.
///
/// Text-like bodies are decoded as UTF-8; anything else is base64-encoded.
/// An error status still yields a page, with both body fields empty.
///
/// # Errors
///
/// Same as [`Fetcher::fetch`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> tool4lm_web::Result<()> {
/// use std::time::Duration;
/// use tool4lm_web::{FetchRequest, Fetcher, WebConfig};
///
/// let fetcher = Fetcher::new(&WebConfig::default());
/// let request = FetchRequest::new("https://example.com", Duration::from_secs(5), 65_536)?;
/// let page = tool4lm_web::fetch_page(&fetcher, &request).await?;
/// println!("{} {}", page.status, page.content_type);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_page(fetcher: &Fetcher, request: &FetchRequest) -> Result<FetchedPage> {
    let result = fetcher.fetch(request).await?;
    Ok(FetchedPage::from_result(result))
}

/// Fetch a page and extract its readable content.
///
/// The page is read under `budget`; an error status or empty body yields
/// an empty [`PageContent`] for the final URL.
///
/// # Errors
///
/// Same as [`Fetcher::fetch`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> tool4lm_web::Result<()> {
/// let config = tool4lm_web::WebConfig::default();
/// let fetcher = tool4lm_web::Fetcher::new(&config);
/// let page = tool4lm_web::read_page(&fetcher, "https://example.com", config.fetch_budget()).await?;
/// println!("Title: {}", page.title);
/// println!("Words: {}", page.word_count);
/// # Ok(())
/// # }
/// ```
pub async fn read_page(fetcher: &Fetcher, url: &str, budget: FetchBudget) -> Result<PageContent> {
    let request = FetchRequest::with_budget(url, budget)?;
    let result = fetcher.fetch(&request).await?;
    let html = result.body_text().unwrap_or_default();
    Ok(content::extract_content(&html, &result.final_url))
}
