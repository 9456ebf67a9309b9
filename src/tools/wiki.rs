//! `wiki.search` and `wiki.get`: Wikipedia title search and summaries.

use async_trait::async_trait;
use tool4lm_web::wiki::WikiClient;

use crate::error::{Result, ToolError};

use super::args::{optional_str, optional_u64, required_str};
use super::types::{Tool, ToolResult, to_output};

/// Titles returned by `wiki.search` when no limit is given.
const DEFAULT_LIMIT: u64 = 5;

/// Largest `limit` accepted by `wiki.search`.
const MAX_LIMIT: u64 = 50;

/// Wikipedia title search in one language edition.
pub struct WikiSearchTool {
    client: WikiClient,
}

impl WikiSearchTool {
    pub fn new(client: WikiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WikiSearchTool {
    fn name(&self) -> &str {
        "wiki.search"
    }

    fn description(&self) -> &str {
        "Wikipedia title search (public API)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "q": {"type": "string", "description": "Title search text"},
                "lang": {"type": "string", "description": "Language edition (default vi)"},
                "limit": {"type": "integer", "description": "Maximum titles (default 5)"}
            },
            "required": ["q"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let q = required_str(&args, "q")?;
        let lang = optional_str(&args, "lang")?;
        let limit = optional_u64(&args, &["limit", "top"])?
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        let limit = usize::try_from(limit)
            .map_err(|_| ToolError::Validation("limit is too large".into()))?;

        let hits = self.client.search(q, lang, limit).await?;
        to_output(&hits)
    }
}

/// Wikipedia page summary by title.
pub struct WikiGetTool {
    client: WikiClient,
}

impl WikiGetTool {
    pub fn new(client: WikiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WikiGetTool {
    fn name(&self) -> &str {
        "wiki.get"
    }

    fn description(&self) -> &str {
        "Wikipedia summary by title."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Exact page title"},
                "lang": {"type": "string", "description": "Language edition (default vi)"}
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let title = required_str(&args, "title")?;
        let lang = optional_str(&args, "lang")?;
        let summary = self.client.get(title, lang).await?;
        to_output(&summary)
    }
}
