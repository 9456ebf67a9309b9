//! Search orchestration: URL canonicalisation and multi-backend aggregation.
//!
//! This module fans a query out to several backends concurrently,
//! deduplicates results by canonical URL, and returns a densely ranked,
//! truncated result set.

pub mod aggregate;
pub mod canonical;

pub use aggregate::{merge_ranked, Aggregator};
pub use canonical::canonicalize;
