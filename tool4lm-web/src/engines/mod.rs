//! Search backend implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchEngineTrait`]
//! that issues one guarded, bounded request to a backend and parses the
//! response into uniform results.

pub mod duckduckgo;
pub mod searxng;

pub use duckduckgo::DuckDuckGoEngine;
pub use searxng::SearxngEngine;

use crate::error::{FetchErrorKind, Result, WebError};
use crate::fetch::FetchResult;

/// Take the body of a backend response, failing on error statuses.
fn require_body(engine: &str, response: FetchResult) -> Result<Vec<u8>> {
    match response.body {
        Some(body) => Ok(body),
        None => Err(WebError::fetch(
            FetchErrorKind::Transport,
            format!("{engine} returned HTTP {}", response.status),
        )),
    }
}
