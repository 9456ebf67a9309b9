//! `web.read`: readable content from supplied HTML or a fetched page.

use async_trait::async_trait;
use tool4lm_web::{FetchBudget, Fetcher, WebConfig};

use crate::error::Result;

use super::args::{optional_str, required_str};
use super::types::{Tool, ToolResult, to_output};

/// Tool that extracts title, language, text, links, and meta tags.
///
/// With `html` the page is not fetched; `url` only resolves relative links.
/// Without it the page at `url` is fetched under the default limits.
pub struct WebReadTool {
    fetcher: Fetcher,
    budget: FetchBudget,
}

impl WebReadTool {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            budget: config.fetch_budget(),
        }
    }
}

#[async_trait]
impl Tool for WebReadTool {
    fn name(&self) -> &str {
        "web.read"
    }

    fn description(&self) -> &str {
        "Extract readable content from given HTML (or pass html from web.fetch)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Page URL; fetched when html is absent"
                },
                "html": {
                    "type": "string",
                    "description": "Raw HTML to extract from instead of fetching"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let url = required_str(&args, "url")?;
        let page = match optional_str(&args, "html")? {
            Some(html) => tool4lm_web::content::extract_content(html, url),
            None => tool4lm_web::read_page(&self.fetcher, url, self.budget).await?,
        };
        to_output(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool() -> WebReadTool {
        let config = WebConfig::default();
        WebReadTool::new(&config, Fetcher::new(&config))
    }

    #[tokio::test]
    async fn supplied_html_is_not_fetched() {
        // A loopback URL would be refused if it were fetched.
        let result = tool()
            .execute(json!({
                "url": "http://127.0.0.1/post",
                "html": "<html lang=\"en\"><head><title>Post</title><meta name=\"author\" content=\"Lan\"></head><body><main>Hello <a href=\"/about\">about</a></main></body></html>"
            }))
            .await
            .expect("extract");

        assert!(result.success);
        assert_eq!(result.output["title"], "Post");
        assert_eq!(result.output["lang"], "en");
        assert_eq!(result.output["meta"]["author"], "Lan");
        assert_eq!(result.output["links"][0]["url"], "http://127.0.0.1/about");
        assert!(result.output["wordCount"].as_u64().is_some_and(|n| n >= 1));
    }

    #[tokio::test]
    async fn missing_html_fetches_through_the_guard() {
        let err = tool()
            .execute(json!({"url": "http://127.0.0.1/post"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("blocked_address"));
    }
}
