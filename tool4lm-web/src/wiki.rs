//! Wikipedia title search and page summaries.
//!
//! Uses the REST endpoints of the language edition named by the caller:
//! `/w/rest.php/v1/search/title` for search and
//! `/api/rest_v1/page/summary/{title}` for summaries.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{FetchBudget, WebConfig};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::{FetchRequest, Fetcher};

/// Source label on every Wikipedia hit.
pub const SOURCE: &str = "wikipedia";

/// One title-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

/// Summary of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiSummary {
    pub title: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub source: String,
    /// Last edit time reported by Wikipedia, or the lookup time.
    pub updated_at: String,
}

/// Client for one Wikipedia deployment (any language edition).
#[derive(Debug, Clone)]
pub struct WikiClient {
    fetcher: Fetcher,
    base: String,
    lang_default: String,
    budget: FetchBudget,
}

impl WikiClient {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base: config.wikipedia_base.clone(),
            lang_default: config.lang_default.clone(),
            budget: config.lookup_budget,
        }
    }

    /// Base URL for `lang`, which must be a plain language code.
    fn edition(&self, lang: Option<&str>) -> Result<Url> {
        let lang = lang
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.lang_default.as_str())
            .to_ascii_lowercase();
        if !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(WebError::InvalidQuery(format!(
                "invalid Wikipedia language code: {lang}"
            )));
        }
        let raw = self.base.replace("{lang}", &lang);
        Url::parse(&raw).map_err(|e| {
            WebError::fetch(
                FetchErrorKind::InvalidUrl,
                format!("invalid Wikipedia base {raw}: {e}"),
            )
        })
    }

    /// `edition` with `segments` appended to its path, each percent-encoded.
    fn endpoint(edition: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = edition.clone();
        url.path_segments_mut()
            .map_err(|()| {
                WebError::fetch(
                    FetchErrorKind::InvalidUrl,
                    format!("Wikipedia base cannot carry a path: {edition}"),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Search page titles. An error status yields no hits.
    ///
    /// # Errors
    ///
    /// Invalid query or language, blocked or failed fetch, or unparseable JSON.
    pub async fn search(&self, q: &str, lang: Option<&str>, limit: usize) -> Result<Vec<WikiHit>> {
        if q.trim().is_empty() {
            return Err(WebError::InvalidQuery("query text must not be empty".into()));
        }
        let edition = self.edition(lang)?;
        let mut url = Self::endpoint(&edition, &["w", "rest.php", "v1", "search", "title"])?;
        url.query_pairs_mut()
            .append_pair("q", q.trim())
            .append_pair("limit", &limit.max(1).to_string());

        tracing::trace!(query = q, %url, "Wikipedia search");
        let Some(body) = self.get_json_body(&url).await? else {
            return Ok(Vec::new());
        };
        let mut hits = parse_search(&body, &edition)?;
        hits.truncate(limit.max(1));
        Ok(hits)
    }

    /// Summary of the page titled `title`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Invalid title or language, blocked or failed fetch, or unparseable JSON.
    pub async fn get(&self, title: &str, lang: Option<&str>) -> Result<Option<WikiSummary>> {
        if title.trim().is_empty() {
            return Err(WebError::InvalidQuery("title must not be empty".into()));
        }
        let edition = self.edition(lang)?;
        let url = Self::endpoint(&edition, &["api", "rest_v1", "page", "summary", title.trim()])?;

        tracing::trace!(title, %url, "Wikipedia summary");
        let Some(body) = self.get_json_body(&url).await? else {
            return Ok(None);
        };
        parse_summary(&body).map(Some)
    }

    async fn get_json_body(&self, url: &Url) -> Result<Option<Vec<u8>>> {
        let request = FetchRequest::with_budget(url.as_str(), self.budget)?;
        let response = self.fetcher.fetch(&request).await?;
        if response.body.is_none() {
            tracing::debug!(status = response.status, "Wikipedia returned no body");
        }
        Ok(response.body)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pages: Vec<SearchPage>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
}

fn parse_search(body: &[u8], edition: &Url) -> Result<Vec<WikiHit>> {
    let response: SearchResponse = serde_json::from_slice(body)
        .map_err(|e| WebError::Parse(format!("invalid Wikipedia search JSON: {e}")))?;

    let mut hits = Vec::with_capacity(response.pages.len());
    for page in response.pages {
        let key = if page.key.is_empty() { page.title.as_str() } else { page.key.as_str() };
        if key.is_empty() {
            continue;
        }
        let url = WikiClient::endpoint(edition, &["wiki", key])?;
        hits.push(WikiHit {
            title: page.title,
            url: url.to_string(),
            snippet: page.description.unwrap_or_default(),
            source: SOURCE.to_string(),
        });
    }
    tracing::debug!(count = hits.len(), "Wikipedia hits parsed");
    Ok(hits)
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    canonical: Option<String>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: Option<String>,
}

fn parse_summary(body: &[u8]) -> Result<WikiSummary> {
    let response: SummaryResponse = serde_json::from_slice(body)
        .map_err(|e| WebError::Parse(format!("invalid Wikipedia summary JSON: {e}")))?;

    let url = response
        .content_urls
        .and_then(|c| c.desktop)
        .and_then(|d| d.page)
        .or(response.canonical)
        .unwrap_or_default();
    Ok(WikiSummary {
        title: response.title,
        url,
        abstract_text: response.extract,
        source: SOURCE.to_string(),
        updated_at: response
            .timestamp
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    })
}
