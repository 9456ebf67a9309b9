//! `sch.search` and `sch.get`: scholarly search and single-work metadata.

use async_trait::async_trait;
use tool4lm_web::scholar::{DEFAULT_TOP, Scholar, WorkId};

use crate::error::{Result, ToolError};

use super::args::{optional_str, optional_u64, required_str};
use super::types::{Tool, ToolResult, to_output};

/// Largest `top` accepted by `sch.search`.
const MAX_TOP: usize = 25;

/// arXiv preprints, Crossref works and English Wikipedia titles for one query.
pub struct ScholarSearchTool {
    scholar: Scholar,
}

impl ScholarSearchTool {
    pub fn new(scholar: Scholar) -> Self {
        Self { scholar }
    }
}

#[async_trait]
impl Tool for ScholarSearchTool {
    fn name(&self) -> &str {
        "sch.search"
    }

    fn description(&self) -> &str {
        "Academic-first search (arXiv + Crossref + Wikipedia)."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "q": {"type": "string", "description": "Search text"},
                "top": {"type": "integer", "description": "Hits per source (default 5)"},
                "limit": {"type": "integer", "description": "Alias of top"}
            },
            "required": ["q"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let q = required_str(&args, "q")?;
        let top = match optional_u64(&args, &["top", "limit"])? {
            Some(top) => usize::try_from(top)
                .map_err(|_| ToolError::Validation("top is too large".into()))?,
            None => DEFAULT_TOP,
        }
        .clamp(1, MAX_TOP);

        let hits = self.scholar.search(q, top).await?;
        to_output(&hits)
    }
}

/// Metadata for a DOI (given directly or found in a URL) or an arXiv id.
pub struct ScholarGetTool {
    scholar: Scholar,
}

impl ScholarGetTool {
    pub fn new(scholar: Scholar) -> Self {
        Self { scholar }
    }
}

#[async_trait]
impl Tool for ScholarGetTool {
    fn name(&self) -> &str {
        "sch.get"
    }

    fn description(&self) -> &str {
        "Get scholarly metadata by DOI, arXiv id, or URL."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "doi": {"type": "string", "description": "DOI, e.g. 10.1145/3418295"},
                "arxivId": {"type": "string", "description": "arXiv identifier, e.g. 1903.00982"},
                "url": {"type": "string", "description": "URL containing a DOI"}
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let id = WorkId {
            doi: optional_str(&args, "doi")?,
            arxiv_id: optional_str(&args, "arxivId")?,
            url: optional_str(&args, "url")?,
        };
        if id == WorkId::default() {
            // Report the primary argument name.
            required_str(&args, "doi")?;
        }
        let hit = self.scholar.get(id).await?;
        to_output(&hit)
    }
}
