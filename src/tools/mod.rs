//! Tool layer: the [`Tool`] trait, the registry, and the built-in tools.
//!
//! # Tools
//!
//! | Name | Alias | Purpose |
//! |------|-------|---------|
//! | `web.fetch` | `web_fetch` | Guarded, bounded GET |
//! | `web.search` | `web_search` | SearXNG + DuckDuckGo aggregation |
//! | `web.read` | `web_read` | Readable content extraction |
//! | `wiki.search` | `wiki_search` | Wikipedia title search |
//! | `wiki.get` | `wiki_get` | Wikipedia page summary |
//! | `sch.search` | `sch_search` | arXiv + Crossref + Wikipedia search |
//! | `sch.get` | `sch_get` | Metadata by DOI, arXiv id, or URL |

pub mod args;
pub mod registry;
pub mod scholar;
pub mod types;
pub mod web_fetch;
pub mod web_read;
pub mod web_search;
pub mod wiki;

use std::sync::Arc;

use tool4lm_web::scholar::Scholar;
use tool4lm_web::wiki::WikiClient;
use tool4lm_web::{Aggregator, Fetcher, WebConfig};

pub use registry::ToolRegistry;
pub use types::{Tool, ToolResult, truncate_output};

/// Build a registry holding every built-in tool, all sharing `fetcher`.
pub fn build_registry(config: &WebConfig, fetcher: Fetcher, max_output_bytes: usize) -> ToolRegistry {
    let aggregator = Aggregator::from_config(config, fetcher.clone());
    let wiki = WikiClient::new(config, fetcher.clone());
    let scholar = Scholar::new(config, fetcher.clone());

    let mut registry = ToolRegistry::new(max_output_bytes);
    registry.register(Arc::new(web_fetch::WebFetchTool::new(config, fetcher.clone())));
    registry.register(Arc::new(web_search::WebSearchTool::new(aggregator)));
    registry.register(Arc::new(web_read::WebReadTool::new(config, fetcher)));
    registry.register(Arc::new(wiki::WikiSearchTool::new(wiki.clone())));
    registry.register(Arc::new(wiki::WikiGetTool::new(wiki)));
    registry.register(Arc::new(scholar::ScholarSearchTool::new(scholar.clone())));
    registry.register(Arc::new(scholar::ScholarGetTool::new(scholar)));
    registry
}
