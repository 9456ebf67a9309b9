//! End-to-end aggregation against mocked SearXNG and DuckDuckGo backends.

use std::sync::Arc;

use serde_json::json;
use tool4lm_web::engine::SearchEngineTrait;
use tool4lm_web::engines::{DuckDuckGoEngine, SearxngEngine};
use tool4lm_web::guard::SystemResolver;
use tool4lm_web::{AddressGuard, Aggregator, Fetcher, MirrorPicker, SearchQuery, WebConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DDG_HTML: &str = r#"<html><body>
<div class="result results_links web-result">
  <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.doc.rust-lang.org%2Fbook%2Fch04-01-what-is-ownership.html%2F&amp;rut=1">What is Ownership?</a>
  <a class="result__snippet">Duplicate of the SearXNG hit.</a>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="https://blog.example/ownership-explained">Ownership explained</a>
  <a class="result__snippet">A friendly walkthrough.</a>
</div>
<div class="result results_links web-result">
  <a class="result__a" href="https://forum.example/t/ownership">Forum thread</a>
</div>
</body></html>"#;

fn searxng_body() -> serde_json::Value {
    json!({
        "query": "rust ownership",
        "results": [
            {
                "url": "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html",
                "title": "What is Ownership? - The Rust Programming Language",
                "content": "Ownership is a set of rules."
            },
            {
                "url": "https://rust-lang.org/learn",
                "title": "Learn Rust",
                "content": "Get started with Rust."
            }
        ]
    })
}

fn config_for(server: &MockServer) -> WebConfig {
    WebConfig {
        searxng_endpoints: vec![format!("{}/search", server.uri())],
        duckduckgo_endpoints: vec![format!("{}/html/", server.uri())],
        ..Default::default()
    }
}

fn open_fetcher(config: &WebConfig) -> Fetcher {
    Fetcher::with_guard(
        config,
        AddressGuard::with_blocklist(vec![], Arc::new(SystemResolver)),
    )
}

fn aggregator_for(config: &WebConfig) -> Aggregator {
    Aggregator::from_config(config, open_fetcher(config))
}

async fn mount_searxng(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .and(query_param("safesearch", "1"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_duckduckgo(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn aggregates_dedupes_and_ranks_across_backends() {
    let server = MockServer::start().await;
    mount_searxng(
        &server,
        ResponseTemplate::new(200).set_body_json(searxng_body()),
    )
    .await;
    mount_duckduckgo(
        &server,
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(DDG_HTML),
    )
    .await;

    let agg = aggregator_for(&config_for(&server));
    let query = SearchQuery::new("rust ownership")
        .with_max_results(3)
        .with_engines(["searxng", "duckduckgo"]);
    let results = agg.aggregate(&query).await.expect("aggregate");

    assert_eq!(results.len(), 3);
    let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    assert_eq!(results[0].source, "searxng");
    assert_eq!(
        results[0].url,
        "https://doc.rust-lang.org/book/ch04-01-what-is-ownership.html"
    );
    assert_eq!(results[1].url, "https://rust-lang.org/learn");
    assert_eq!(results[2].source, "duckduckgo");
    assert_eq!(results[2].url, "https://blog.example/ownership-explained");
}

#[tokio::test]
async fn backend_order_follows_the_query() {
    let server = MockServer::start().await;
    mount_searxng(
        &server,
        ResponseTemplate::new(200).set_body_json(searxng_body()),
    )
    .await;
    mount_duckduckgo(&server, ResponseTemplate::new(200).set_body_string(DDG_HTML)).await;

    let agg = aggregator_for(&config_for(&server));
    let query = SearchQuery::new("rust ownership").with_engines(["duckduckgo", "searxng"]);
    let results = agg.aggregate(&query).await.expect("aggregate");

    assert_eq!(results[0].source, "duckduckgo");
    // The SearXNG copy of the shared page is dropped as a duplicate.
    assert_eq!(results.len(), 4);
    assert_eq!(results.iter().filter(|r| r.source == "searxng").count(), 1);
}

#[tokio::test]
async fn one_failing_backend_does_not_fail_the_search() {
    let server = MockServer::start().await;
    mount_searxng(&server, ResponseTemplate::new(200).set_body_string("{not json")).await;
    mount_duckduckgo(&server, ResponseTemplate::new(200).set_body_string(DDG_HTML)).await;

    let agg = aggregator_for(&config_for(&server));
    let results = agg
        .aggregate(&SearchQuery::new("rust ownership"))
        .await
        .expect("aggregate");

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.source == "duckduckgo"));
    assert_eq!(
        results[0].url,
        "https://www.doc.rust-lang.org/book/ch04-01-what-is-ownership.html/"
    );
}

#[tokio::test]
async fn all_backends_failing_yields_empty_list() {
    let server = MockServer::start().await;
    mount_searxng(&server, ResponseTemplate::new(500)).await;
    mount_duckduckgo(&server, ResponseTemplate::new(503)).await;

    let agg = aggregator_for(&config_for(&server));
    let results = agg
        .aggregate(&SearchQuery::new("rust ownership"))
        .await
        .expect("backend failures are not errors");

    assert!(results.is_empty());
}

#[tokio::test]
async fn language_and_site_reach_the_backends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "site:docs.rs tokio"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "site:docs.rs tokio"))
        .and(query_param("kl", "vn-en"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let agg = aggregator_for(&config_for(&server));
    let query = SearchQuery::new("tokio").with_lang("en").with_site("docs.rs");
    let results = agg.aggregate(&query).await.expect("aggregate");
    assert!(results.is_empty());
}

#[tokio::test]
async fn mirror_picker_selects_the_endpoint() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searxng_body()))
        .expect(0)
        .mount(&primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(searxng_body()))
        .expect(1)
        .mount(&secondary)
        .await;

    let config = WebConfig {
        searxng_endpoints: vec![
            format!("{}/search", primary.uri()),
            format!("{}/search", secondary.uri()),
        ],
        ..Default::default()
    };
    let engine = SearxngEngine::new(&config, open_fetcher(&config)).with_picker(MirrorPicker::fixed(1));
    let results = engine
        .try_search(&SearchQuery::new("rust ownership"))
        .await
        .expect("search");
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn duckduckgo_adapter_unwraps_redirect_links() {
    let server = MockServer::start().await;
    mount_duckduckgo(&server, ResponseTemplate::new(200).set_body_string(DDG_HTML)).await;

    let config = config_for(&server);
    let engine = DuckDuckGoEngine::new(&config, open_fetcher(&config));
    let results = engine
        .try_search(&SearchQuery::new("rust ownership").with_max_results(2))
        .await
        .expect("search");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.url.contains("duckduckgo.com/l/")));
    assert_eq!(results[1].rank, 2);
}

#[tokio::test]
async fn invalid_query_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let agg = aggregator_for(&config_for(&server));
    assert!(agg.aggregate(&SearchQuery::new("")).await.is_err());
}
