//! `web.search`: multi-engine search through the aggregator.

use async_trait::async_trait;
use tool4lm_web::types::DEFAULT_MAX_RESULTS;
use tool4lm_web::{Aggregator, SearchQuery};

use crate::error::{Result, ToolError};

use super::args::{optional_str, optional_u64, required_str, string_list};
use super::types::{Tool, ToolResult, to_output};

/// Tool that searches SearXNG and DuckDuckGo concurrently and returns one
/// deduplicated, ranked list.
///
/// # Arguments (JSON)
///
/// - `q` (string, required): the search query
/// - `max` (integer, optional; aliases `k`, `limit`): result count, default 10
/// - `lang` (string, optional): language hint
/// - `site` (string, optional): restrict to one site
/// - `engines` (array of strings, optional): backends in priority order
pub struct WebSearchTool {
    aggregator: Aggregator,
}

impl WebSearchTool {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    fn query(args: &serde_json::Value) -> Result<SearchQuery> {
        let text = required_str(args, "q")?;
        let max = optional_u64(args, &["max", "k", "limit"])?
            .map_or(Ok(DEFAULT_MAX_RESULTS), usize::try_from)
            .map_err(|_| ToolError::Validation("max is too large".into()))?;

        let mut query = SearchQuery::new(text)
            .with_max_results(max)
            .with_engines(string_list(args, "engines")?);
        if let Some(lang) = optional_str(args, "lang")? {
            query = query.with_lang(lang);
        }
        if let Some(site) = optional_str(args, "site")? {
            query = query.with_site(site);
        }
        Ok(query)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web.search"
    }

    fn description(&self) -> &str {
        "Multi-engine web search (SearXNG + DuckDuckGo HTML)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "q": {"type": "string", "description": "The search query"},
                "max": {"type": "integer", "description": "Maximum results (default 10)"},
                "k": {"type": "integer", "description": "Alias of max"},
                "limit": {"type": "integer", "description": "Alias of max"},
                "lang": {"type": "string", "description": "Language hint, e.g. vi or en"},
                "site": {"type": "string", "description": "Restrict results to this site"},
                "engines": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Backends in priority order: searxng, duckduckgo"
                }
            },
            "required": ["q"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let query = Self::query(&args)?;
        let results = self.aggregator.aggregate(&query).await?;
        to_output(&results)
    }
}
