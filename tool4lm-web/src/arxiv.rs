//! arXiv preprint search over the Atom query API.
//!
//! Searches send `search_query=all:<q>`; single lookups send `id_list`.
//! Feed entries without an `/abs/` identifier (arXiv reports bad ids as
//! error entries) are skipped.

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{FetchBudget, WebConfig};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::{FetchRequest, Fetcher};

/// Source label on every arXiv preprint.
pub const SOURCE: &str = "arxiv";

/// Metadata for one preprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preprint {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i64>,
    /// Identifier with version, e.g. `2101.00001v2`.
    pub arxiv_id: String,
    pub pdf_url: String,
    pub url: String,
    pub source: String,
}

/// arXiv Atom API client.
#[derive(Debug, Clone)]
pub struct ArxivClient {
    fetcher: Fetcher,
    endpoint: String,
    budget: FetchBudget,
}

impl ArxivClient {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            endpoint: config.arxiv_endpoint.clone(),
            budget: config.arxiv_budget,
        }
    }

    fn query_url(&self, pairs: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            WebError::fetch(
                FetchErrorKind::InvalidUrl,
                format!("invalid arXiv endpoint {}: {e}", self.endpoint),
            )
        })?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }

    async fn feed(&self, url: &Url) -> Result<Vec<Preprint>> {
        let request = FetchRequest::with_budget(url.as_str(), self.budget)?;
        let response = self.fetcher.fetch(&request).await?;
        match response.body {
            Some(body) => parse_feed(&body),
            None => {
                tracing::debug!(status = response.status, "arXiv returned no body");
                Ok(Vec::new())
            }
        }
    }

    /// Preprints matching `q` in any field, at most `top`.
    ///
    /// # Errors
    ///
    /// Blank query, blocked or failed fetch, or malformed XML.
    pub async fn search(&self, q: &str, top: usize) -> Result<Vec<Preprint>> {
        let q = q.trim();
        if q.is_empty() {
            return Err(WebError::InvalidQuery("query text must not be empty".into()));
        }
        let top = top.max(1);
        let search_query = format!("all:{q}");
        let max_results = top.to_string();
        let url = self.query_url(&[
            ("search_query", search_query.as_str()),
            ("start", "0"),
            ("max_results", max_results.as_str()),
        ])?;

        tracing::trace!(query = q, "arXiv search");
        let mut preprints = self.feed(&url).await?;
        preprints.truncate(top);
        tracing::debug!(count = preprints.len(), "arXiv entries parsed");
        Ok(preprints)
    }

    /// The preprint with identifier `arxiv_id`, or `None` if arXiv has none.
    ///
    /// # Errors
    ///
    /// Blank identifier, blocked or failed fetch, or malformed XML.
    pub async fn get(&self, arxiv_id: &str) -> Result<Option<Preprint>> {
        let arxiv_id = arxiv_id.trim();
        if arxiv_id.is_empty() {
            return Err(WebError::InvalidQuery("arxivId must not be empty".into()));
        }
        let url = self.query_url(&[("id_list", arxiv_id), ("max_results", "1")])?;

        tracing::trace!(arxiv_id, "arXiv lookup");
        Ok(self.feed(&url).await?.into_iter().next())
    }
}

/// Parse an Atom feed into preprints, skipping error entries.
fn parse_feed(body: &[u8]) -> Result<Vec<Preprint>> {
    let text = std::str::from_utf8(body)
        .map_err(|e| WebError::Parse(format!("arXiv feed is not UTF-8: {e}")))?;
    let document = Document::parse(text)
        .map_err(|e| WebError::Parse(format!("invalid arXiv Atom XML: {e}")))?;

    Ok(document
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("entry"))
        .filter_map(parse_entry)
        .collect())
}

fn parse_entry(entry: Node<'_, '_>) -> Option<Preprint> {
    let id = child_text(entry, "id")?;
    let arxiv_id = id.split_once("/abs/")?.1.trim().to_string();
    if arxiv_id.is_empty() {
        return None;
    }

    let pdf_url = entry
        .children()
        .filter(|n| n.has_tag_name("link"))
        .find(|n| n.attribute("type") == Some("application/pdf"))
        .and_then(|n| n.attribute("href"))
        .unwrap_or_default()
        .to_string();

    Some(Preprint {
        title: collapse(child_text(entry, "title").unwrap_or_default()),
        authors: entry
            .children()
            .filter(|n| n.has_tag_name("author"))
            .filter_map(|a| child_text(a, "name"))
            .map(collapse)
            .filter(|name| !name.is_empty())
            .collect(),
        year: child_text(entry, "published")
            .and_then(|p| p.trim().get(..4))
            .and_then(|y| y.parse().ok()),
        url: format!("https://arxiv.org/abs/{arxiv_id}"),
        arxiv_id,
        pdf_url,
        source: SOURCE.to_string(),
    })
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
}

/// Atom titles wrap across lines; fold runs of whitespace.
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
