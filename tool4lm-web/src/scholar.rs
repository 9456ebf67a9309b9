//! Scholarly lookups: arXiv preprints, Crossref works and English
//! Wikipedia titles.
//!
//! [`Scholar::search`] queries the three sources concurrently and
//! concatenates their lists. [`Scholar::get`] resolves a DOI (given
//! directly or found inside a URL) through Crossref, or an arXiv id
//! through arXiv.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::arxiv::{ArxivClient, Preprint};
use crate::config::{FetchBudget, WebConfig};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::{FetchRequest, Fetcher};
use crate::wiki::{WikiClient, WikiHit};

/// Source label on every Crossref work.
pub const SOURCE: &str = "crossref";

/// Default number of hits per source.
pub const DEFAULT_TOP: usize = 5;

/// Bibliographic metadata for one work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i64>,
    pub doi: String,
    pub url: String,
    /// Plain-text abstract; only filled by single-work lookups.
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub source: String,
}

/// One hit in a combined scholarly search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScholarHit {
    Preprint(Preprint),
    Work(Work),
    Wiki(WikiHit),
}

/// Crossref REST client.
#[derive(Debug, Clone)]
pub struct CrossrefClient {
    fetcher: Fetcher,
    base: String,
    budget: FetchBudget,
}

impl CrossrefClient {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            base: config.crossref_base.clone(),
            budget: config.lookup_budget,
        }
    }

    fn works_url(&self, doi: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base).map_err(|e| {
            WebError::fetch(
                FetchErrorKind::InvalidUrl,
                format!("invalid Crossref base {}: {e}", self.base),
            )
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                WebError::fetch(
                    FetchErrorKind::InvalidUrl,
                    format!("Crossref base cannot carry a path: {}", self.base),
                )
            })?;
            segments.pop_if_empty().push("works");
            if let Some(doi) = doi {
                segments.push(doi);
            }
        }
        Ok(url)
    }

    async fn get_body(&self, url: &Url) -> Result<Option<Vec<u8>>> {
        let request = FetchRequest::with_budget(url.as_str(), self.budget)?;
        let response = self.fetcher.fetch(&request).await?;
        if response.body.is_none() {
            tracing::debug!(status = response.status, "Crossref returned no body");
        }
        Ok(response.body)
    }

    /// Search works matching `q`, at most `rows`.
    ///
    /// # Errors
    ///
    /// Blank query, blocked or failed fetch, or unparseable JSON.
    pub async fn search(&self, q: &str, rows: usize) -> Result<Vec<Work>> {
        if q.trim().is_empty() {
            return Err(WebError::InvalidQuery("query text must not be empty".into()));
        }
        let mut url = self.works_url(None)?;
        url.query_pairs_mut()
            .append_pair("query", q.trim())
            .append_pair("rows", &rows.max(1).to_string());

        tracing::trace!(query = q, "Crossref search");
        let Some(body) = self.get_body(&url).await? else {
            return Ok(Vec::new());
        };
        let envelope: Envelope<WorkList> = serde_json::from_slice(&body)
            .map_err(|e| WebError::Parse(format!("invalid Crossref JSON: {e}")))?;
        let works: Vec<Work> = envelope
            .message
            .items
            .into_iter()
            .take(rows.max(1))
            .map(|w| w.into_work(false))
            .collect();
        tracing::debug!(count = works.len(), "Crossref works parsed");
        Ok(works)
    }

    /// Metadata for `doi`, or `None` when Crossref has no such work.
    ///
    /// # Errors
    ///
    /// Blank DOI, blocked or failed fetch, or unparseable JSON.
    pub async fn get(&self, doi: &str) -> Result<Option<Work>> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Err(WebError::InvalidQuery("doi must not be empty".into()));
        }
        let url = self.works_url(Some(doi))?;

        tracing::trace!(doi, "Crossref lookup");
        let Some(body) = self.get_body(&url).await? else {
            return Ok(None);
        };
        let envelope: Envelope<CrossrefWork> = serde_json::from_slice(&body)
            .map_err(|e| WebError::Parse(format!("invalid Crossref JSON: {e}")))?;
        Ok(Some(envelope.message.into_work(true)))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    message: T,
}

#[derive(Debug, Deserialize)]
struct WorkList {
    #[serde(default)]
    items: Vec<CrossrefWork>,
}

#[derive(Debug, Deserialize)]
struct CrossrefWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CrossrefAuthor>,
    #[serde(default)]
    created: Option<DateParts>,
    #[serde(default)]
    issued: Option<DateParts>,
    #[serde(rename = "DOI", default)]
    doi: String,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateParts {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl DateParts {
    fn year(&self) -> Option<i64> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

impl CrossrefAuthor {
    fn display_name(self) -> Option<String> {
        let joined = [self.given, self.family]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            self.name.filter(|n| !n.trim().is_empty())
        } else {
            Some(joined)
        }
    }
}

impl CrossrefWork {
    fn into_work(self, with_abstract: bool) -> Work {
        let year = self
            .created
            .as_ref()
            .and_then(DateParts::year)
            .or_else(|| self.issued.as_ref().and_then(DateParts::year));
        Work {
            title: self.title.into_iter().next().unwrap_or_default(),
            authors: self
                .author
                .into_iter()
                .filter_map(CrossrefAuthor::display_name)
                .collect(),
            year,
            doi: self.doi,
            url: self.url,
            abstract_text: if with_abstract {
                Some(strip_markup(self.abstract_text.as_deref().unwrap_or_default()))
            } else {
                None
            },
            source: SOURCE.to_string(),
        }
    }
}

/// Remove `<...>` tags (Crossref abstracts are JATS XML fragments).
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Find the first DOI (`10.NNNN/suffix`, 4 to 9 registrant digits) in `text`.
///
/// The suffix runs over ASCII letters, digits and `-._;()/:`.
pub fn extract_doi(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find("10.") {
        let at = start + offset;
        let digits_start = at + 3;
        let digits = bytes[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let slash = digits_start + digits;
        if (4..=9).contains(&digits) && bytes.get(slash) == Some(&b'/') {
            let suffix = bytes[slash + 1..]
                .iter()
                .take_while(|&&b| b.is_ascii_alphanumeric() || b"-._;()/:".contains(&b))
                .count();
            if suffix > 0 {
                return Some(text[at..slash + 1 + suffix].to_string());
            }
        }
        start = at + 3;
    }
    None
}

/// Identifiers accepted by [`Scholar::get`]; the first that resolves wins,
/// in the order `doi`, `arxiv_id`, DOI inside `url`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkId<'a> {
    pub doi: Option<&'a str>,
    pub arxiv_id: Option<&'a str>,
    pub url: Option<&'a str>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Combined scholarly search and single-work lookup.
#[derive(Debug, Clone)]
pub struct Scholar {
    arxiv: ArxivClient,
    crossref: CrossrefClient,
    wiki: WikiClient,
}

impl Scholar {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            arxiv: ArxivClient::new(config, fetcher.clone()),
            crossref: CrossrefClient::new(config, fetcher.clone()),
            wiki: WikiClient::new(config, fetcher),
        }
    }

    /// arXiv preprints, then Crossref works, then English Wikipedia
    /// titles, at most `2 * top` hits. A failing source contributes nothing.
    ///
    /// # Errors
    ///
    /// Only a blank query.
    pub async fn search(&self, q: &str, top: usize) -> Result<Vec<ScholarHit>> {
        if q.trim().is_empty() {
            return Err(WebError::InvalidQuery("query text must not be empty".into()));
        }
        let top = top.max(1);
        let (preprints, works, pages) = futures::join!(
            self.arxiv.search(q, top),
            self.crossref.search(q, top),
            self.wiki.search(q, Some("en"), top)
        );

        let preprints = absorb(crate::arxiv::SOURCE, preprints);
        let works = absorb(SOURCE, works);
        let pages = absorb(crate::wiki::SOURCE, pages);

        Ok(preprints
            .into_iter()
            .map(ScholarHit::Preprint)
            .chain(works.into_iter().map(ScholarHit::Work))
            .chain(pages.into_iter().map(ScholarHit::Wiki))
            .take(top.saturating_mul(2))
            .collect())
    }

    /// Metadata for the first identifier in `id` that resolves.
    ///
    /// Returns `None` when no identifier yields a record.
    ///
    /// # Errors
    ///
    /// Blocked or failed fetch, or an unparseable response.
    pub async fn get(&self, id: WorkId<'_>) -> Result<Option<ScholarHit>> {
        if let Some(doi) = non_blank(id.doi) {
            if let Some(work) = self.crossref.get(doi).await? {
                return Ok(Some(ScholarHit::Work(work)));
            }
        }
        if let Some(arxiv_id) = non_blank(id.arxiv_id) {
            if let Some(preprint) = self.arxiv.get(arxiv_id).await? {
                return Ok(Some(ScholarHit::Preprint(preprint)));
            }
        }
        match id.url.and_then(extract_doi) {
            Some(doi) => Ok(self.crossref.get(&doi).await?.map(ScholarHit::Work)),
            None => Ok(None),
        }
    }
}

fn absorb<T>(source: &str, outcome: Result<Vec<T>>) -> Vec<T> {
    outcome.unwrap_or_else(|err| {
        tracing::warn!(source, error = %err, "scholar source failed");
        Vec::new()
    })
}
