//! tool4lm: guarded web search and lookup tools for model-driven clients.
//!
//! Tools are exposed over a newline-delimited JSON protocol on
//! stdin/stdout by the `tool4lm-host` binary:
//!
//! ```text
//! client ──CommandEnvelope──▶ stdio bridge ──▶ router ──▶ ToolRegistry ──▶ tool4lm-web
//!        ◀─ResponseEnvelope──
//! ```
//!
//! The fetching, search aggregation, and lookup logic lives in the
//! [`tool4lm_web`] crate; this crate adds argument handling, output caps,
//! configuration loading, and the host transport.

pub mod config;
pub mod error;
pub mod host;
pub mod tools;

pub use config::{HostConfig, Tool4lmConfig};
pub use error::{Result, ToolError};
pub use tools::{Tool, ToolRegistry, ToolResult};

/// Registry of every built-in tool for `config`.
pub fn registry_for(config: &Tool4lmConfig) -> ToolRegistry {
    let fetcher = tool4lm_web::Fetcher::new(&config.web);
    tools::build_registry(&config.web, fetcher, config.host.max_output_bytes)
}
