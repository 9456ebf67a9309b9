//! DuckDuckGo backend, scraping the HTML-only endpoint.
//!
//! Uses `https://html.duckduckgo.com/html/` (or a configured mirror),
//! which requires no JavaScript and is tolerant of automated requests.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::config::{FetchBudget, WebConfig};
use crate::engine::{number_results, MirrorPicker, SearchEngineTrait};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::{FetchRequest, Fetcher};
use crate::types::{SearchQuery, SearchResult};

/// Backend name reported in [`SearchResult::source`].
pub const NAME: &str = "duckduckgo";

/// DuckDuckGo HTML search scraper.
#[derive(Debug, Clone)]
pub struct DuckDuckGoEngine {
    fetcher: Fetcher,
    endpoints: Vec<String>,
    lang_default: String,
    region: String,
    budget: FetchBudget,
    picker: MirrorPicker,
}

impl DuckDuckGoEngine {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoints: config.duckduckgo_endpoints.clone(),
            lang_default: config.lang_default.clone(),
            region: config.region_default.clone(),
            budget: config.duckduckgo_budget,
            picker: MirrorPicker::default(),
        }
    }

    /// Replace the mirror picker.
    #[must_use]
    pub fn with_picker(mut self, picker: MirrorPicker) -> Self {
        self.picker = picker;
        self
    }

    /// DuckDuckGo locale, e.g. `vn-vi`.
    fn locale(&self, query: &SearchQuery) -> String {
        let lang = query
            .lang
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.lang_default.as_str());
        format!("{}-{}", self.region, lang).to_lowercase()
    }

    fn request_url(&self, endpoint: &str, query: &SearchQuery) -> Result<Url> {
        Url::parse_with_params(
            endpoint,
            &[
                ("q", query.backend_text().as_str()),
                ("kl", self.locale(query).as_str()),
            ],
        )
        .map_err(|e| {
            WebError::fetch(
                FetchErrorKind::InvalidUrl,
                format!("invalid DuckDuckGo endpoint {endpoint}: {e}"),
            )
        })
    }

    /// Extract the actual URL from DuckDuckGo's redirect wrapper.
    ///
    /// DDG wraps URLs like: `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
    /// We parse out the `uddg` query parameter and URL-decode it.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;

        let is_redirect = parsed
            .host_str()
            .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"))
            && parsed.path().starts_with("/l/");
        if is_redirect {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }
}

#[async_trait]
impl SearchEngineTrait for DuckDuckGoEngine {
    fn name(&self) -> &str {
        NAME
    }

    async fn try_search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let Some(endpoint) = self.picker.pick(&self.endpoints) else {
            tracing::debug!("no DuckDuckGo endpoints configured");
            return Ok(Vec::new());
        };
        tracing::trace!(query = %query.text, endpoint, "DuckDuckGo search");

        let url = self.request_url(endpoint, query)?;
        let request = FetchRequest::with_budget(url.as_str(), self.budget)?;
        let response = self.fetcher.fetch(&request).await?;
        let body = super::require_body(NAME, response)?;
        let html = String::from_utf8_lossy(&body);

        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        parse_duckduckgo_html(&html, query.max_results)
    }
}

/// Parse DuckDuckGo HTML response into search results.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_duckduckgo_html(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(".result:not(.result--ad)")
        .map_err(|e| WebError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse("a.result__a")
        .map_err(|e| WebError::Parse(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| WebError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let Some(url) = title_el
            .value()
            .attr("href")
            .and_then(DuckDuckGoEngine::extract_url)
        else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            snippet,
            source: NAME.to_string(),
            rank: 0,
        });

        if results.len() >= max_results {
            break;
        }
    }
    number_results(&mut results);

    tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
    Ok(results)
}
