//! Bounded HTTP fetcher.
//!
//! One GET per call, no retries. Every hop (the initial target and each
//! redirect destination) is vetted by the [`AddressGuard`] and the client
//! for that hop is pinned to the vetted addresses, so the connection can
//! only reach what was checked. The whole operation (DNS, connect, headers,
//! body, all hops) runs under a single wall-clock timeout, and the body is
//! read chunk by chunk and cut at the byte cap.

use reqwest::header::{HeaderMap, ACCEPT, LOCATION};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

use crate::config::{FetchBudget, WebConfig};
use crate::error::{FetchErrorKind, Result, WebError};
use crate::guard::{pinned_socket_addrs, AddressGuard};

/// Content type reported when the response carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A validated fetch target with its time and size budget.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    raw: String,
    url: Url,
    timeout: Duration,
    max_bytes: usize,
}

impl FetchRequest {
    /// Build a request.
    ///
    /// # Errors
    ///
    /// [`WebError::Config`] for a zero timeout or byte cap, and an
    /// `InvalidUrl` fetch error unless `url` is an absolute http(s) URL
    /// with a host.
    pub fn new(url: &str, timeout: Duration, max_bytes: usize) -> Result<Self> {
        if timeout.is_zero() {
            return Err(WebError::Config("fetch timeout must be positive".into()));
        }
        if max_bytes == 0 {
            return Err(WebError::Config("fetch max_bytes must be positive".into()));
        }
        Ok(Self {
            raw: url.to_owned(),
            url: parse_target(url)?,
            timeout,
            max_bytes,
        })
    }

    /// Build a request from a configured budget.
    pub fn with_budget(url: &str, budget: FetchBudget) -> Result<Self> {
        Self::new(url, budget.timeout(), budget.max_bytes)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

/// Outcome of a fetch that reached an HTTP response.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status of the final hop.
    pub status: u16,
    /// Response headers, lower-cased names, first value per name.
    pub headers: BTreeMap<String, String>,
    /// Body bytes, at most the request's byte cap. `None` for status >= 400.
    pub body: Option<Vec<u8>>,
    /// `content-type` header or [`DEFAULT_CONTENT_TYPE`].
    pub content_type: String,
    /// URL of the last redirect hop, or the request URL as given.
    pub final_url: String,
}

impl FetchResult {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Performs guarded, bounded GET requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    guard: AddressGuard,
    user_agent: String,
    max_redirects: usize,
}

impl Fetcher {
    /// Fetcher with the default block-list and the system resolver.
    pub fn new(config: &WebConfig) -> Self {
        Self::with_guard(config, AddressGuard::new())
    }

    /// Fetcher with a custom guard.
    pub fn with_guard(config: &WebConfig, guard: AddressGuard) -> Self {
        Self {
            guard,
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
        }
    }

    pub fn guard(&self) -> &AddressGuard {
        &self.guard
    }

    /// Fetch `request` under its timeout and byte cap.
    ///
    /// # Errors
    ///
    /// - [`WebError::BlockedAddress`] if any hop targets a blocked address
    /// - [`WebError::Fetch`] with kind `Timeout`, `Dns`, `RedirectLimit`,
    ///   `InvalidUrl` or `Transport`
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResult> {
        tracing::trace!(url = %request.url, "fetch");
        match tokio::time::timeout(request.timeout, self.fetch_hops(request)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let ms = request.timeout.as_millis();
                tracing::debug!(url = %request.url, ms, "fetch timed out");
                Err(WebError::fetch(
                    FetchErrorKind::Timeout,
                    format!("{} exceeded {ms} ms", request.url),
                ))
            }
        }
    }

    async fn fetch_hops(&self, request: &FetchRequest) -> Result<FetchResult> {
        let mut url = request.url.clone();
        let mut redirects = 0usize;

        loop {
            let response = self.send_pinned(&url).await?;

            if let Some(next) = redirect_target(&url, &response)? {
                if redirects >= self.max_redirects {
                    return Err(WebError::fetch(
                        FetchErrorKind::RedirectLimit,
                        format!("more than {} redirects from {}", self.max_redirects, request.url),
                    ));
                }
                redirects += 1;
                tracing::debug!(from = %url, to = %next, hop = redirects, "following redirect");
                url = next;
                continue;
            }

            let final_url = if redirects == 0 {
                request.raw.clone()
            } else {
                url.to_string()
            };
            return read_bounded(response, final_url, request.max_bytes).await;
        }
    }

    /// Vet the hop's host, then send through a client pinned to the vetted
    /// addresses.
    async fn send_pinned(&self, url: &Url) -> Result<reqwest::Response> {
        let host = url
            .host_str()
            .ok_or_else(|| WebError::fetch(FetchErrorKind::InvalidUrl, format!("{url} has no host")))?;
        let ips = self.guard.vet(host).await?;
        let client = self.build_client(url, &ips)?;

        client
            .get(url.clone())
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| transport_error(url, &e))
    }

    fn build_client(&self, url: &Url, ips: &[IpAddr]) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy();
        if let Some(url::Host::Domain(domain)) = url.host() {
            builder = builder.resolve_to_addrs(domain, &pinned_socket_addrs(ips));
        }
        builder.build().map_err(|e| {
            WebError::fetch(
                FetchErrorKind::Transport,
                format!("failed to build HTTP client: {e}"),
            )
        })
    }
}

/// Parse and check a fetch target.
fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| WebError::fetch(FetchErrorKind::InvalidUrl, format!("{raw}: {e}")))?;
    check_scheme(&url)?;
    if url.host_str().is_none() {
        return Err(WebError::fetch(
            FetchErrorKind::InvalidUrl,
            format!("{raw} has no host"),
        ));
    }
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(WebError::fetch(
            FetchErrorKind::InvalidUrl,
            format!("unsupported scheme {other:?} in {url}"),
        )),
    }
}

fn is_followed_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Destination of a redirect response, or `None` if this response ends the
/// chain (not a followed status, or no `Location`).
fn redirect_target(current: &Url, response: &reqwest::Response) -> Result<Option<Url>> {
    if !is_followed_redirect(response.status().as_u16()) {
        return Ok(None);
    }
    resolve_location(current, response.headers())
}

fn resolve_location(current: &Url, headers: &HeaderMap) -> Result<Option<Url>> {
    let Some(location) = headers.get(LOCATION) else {
        return Ok(None);
    };
    let location = location.to_str().map_err(|_| {
        WebError::fetch(
            FetchErrorKind::InvalidUrl,
            format!("non-ASCII redirect location from {current}"),
        )
    })?;
    let next = current.join(location).map_err(|e| {
        WebError::fetch(
            FetchErrorKind::InvalidUrl,
            format!("bad redirect location {location:?}: {e}"),
        )
    })?;
    check_scheme(&next)?;
    Ok(Some(next))
}

fn transport_error(url: &Url, err: &reqwest::Error) -> WebError {
    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Transport
    };
    WebError::fetch(kind, format!("request to {url} failed: {err}"))
}

/// First value per header name, names lower-cased.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        out.entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// Read at most `max_bytes` of the body. Error statuses skip the body.
async fn read_bounded(
    mut response: reqwest::Response,
    final_url: String,
    max_bytes: usize,
) -> Result<FetchResult> {
    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let content_type = headers
        .get("content-type")
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());

    if status >= 400 {
        tracing::debug!(status, url = %final_url, "error status; body not read");
        return Ok(FetchResult {
            status,
            headers,
            body: None,
            content_type,
            final_url,
        });
    }

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| {
        WebError::fetch(
            FetchErrorKind::Transport,
            format!("failed reading body of {final_url}: {e}"),
        )
    })? {
        let remaining = max_bytes - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            if chunk.len() > remaining {
                tracing::debug!(max_bytes, url = %final_url, "body truncated at byte cap");
            }
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(FetchResult {
        status,
        headers,
        body: Some(body),
        content_type,
        final_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn request_rejects_zero_timeout() {
        let err = FetchRequest::new("https://example.com", Duration::ZERO, 10).unwrap_err();
        assert!(matches!(err, WebError::Config(_)));
    }

    #[test]
    fn request_rejects_zero_bytes() {
        let err = FetchRequest::new("https://example.com", Duration::from_secs(1), 0).unwrap_err();
        assert!(err.to_string().contains("max_bytes"));
    }

    #[test]
    fn request_rejects_relative_url() {
        let err = FetchRequest::new("/just/a/path", Duration::from_secs(1), 10).unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::InvalidUrl));
    }

    #[test]
    fn request_rejects_non_http_scheme() {
        for url in ["file:///etc/passwd", "ftp://example.com/x", "gopher://example.com"] {
            let err = FetchRequest::new(url, Duration::from_secs(1), 10).unwrap_err();
            assert_eq!(err.fetch_kind(), Some(FetchErrorKind::InvalidUrl), "{url}");
        }
    }

    #[test]
    fn request_from_budget() {
        let req = FetchRequest::with_budget("https://example.com/a", FetchBudget::new(250, 64))
            .expect("valid request");
        assert_eq!(req.timeout(), Duration::from_millis(250));
        assert_eq!(req.max_bytes(), 64);
        assert_eq!(req.url().path(), "/a");
    }

    #[test]
    fn followed_redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            assert!(is_followed_redirect(status));
        }
        for status in [200, 300, 304, 404] {
            assert!(!is_followed_redirect(status));
        }
    }

    #[test]
    fn relative_location_resolves_against_current() {
        let current = Url::parse("https://example.com/a/b").expect("url");
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("../c?x=1"));
        let next = resolve_location(&current, &headers)
            .expect("resolves")
            .expect("has location");
        assert_eq!(next.as_str(), "https://example.com/c?x=1");
    }

    #[test]
    fn missing_location_ends_chain() {
        let current = Url::parse("https://example.com/").expect("url");
        let next = resolve_location(&current, &HeaderMap::new()).expect("ok");
        assert!(next.is_none());
    }

    #[test]
    fn redirect_to_file_scheme_rejected() {
        let current = Url::parse("https://example.com/").expect("url");
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("file:///etc/passwd"));
        let err = resolve_location(&current, &headers).unwrap_err();
        assert_eq!(err.fetch_kind(), Some(FetchErrorKind::InvalidUrl));
    }

    #[test]
    fn headers_keep_first_value_lowercased() {
        let mut headers = HeaderMap::new();
        headers.append(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.append("x-multi", HeaderValue::from_static("first"));
        headers.append("x-multi", HeaderValue::from_static("second"));
        let collected = collect_headers(&headers);
        assert_eq!(collected.get("content-type").map(String::as_str), Some("text/html"));
        assert_eq!(collected.get("x-multi").map(String::as_str), Some("first"));
    }

    #[test]
    fn body_text_is_lossy_utf8() {
        let result = FetchResult {
            status: 200,
            headers: BTreeMap::new(),
            body: Some(vec![b'h', b'i', 0xff]),
            content_type: "text/plain".into(),
            final_url: "https://example.com".into(),
        };
        assert_eq!(result.body_text().as_deref(), Some("hi\u{fffd}"));
    }

    #[tokio::test]
    async fn blocked_literal_fails_before_connecting() {
        let fetcher = Fetcher::new(&WebConfig::default());
        let req = FetchRequest::new("http://127.0.0.1:9/", Duration::from_secs(2), 1024)
            .expect("valid request");
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, WebError::BlockedAddress(_)), "got {err}");
    }

    #[tokio::test]
    async fn blocked_metadata_endpoint() {
        let fetcher = Fetcher::new(&WebConfig::default());
        let req = FetchRequest::new(
            "http://169.254.169.254/latest/meta-data/",
            Duration::from_secs(2),
            1024,
        )
        .expect("valid request");
        assert!(matches!(
            fetcher.fetch(&req).await,
            Err(WebError::BlockedAddress(_))
        ));
    }
}
