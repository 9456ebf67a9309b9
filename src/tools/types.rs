//! Core tool types.
//!
//! Defines the [`Tool`] trait every tool implements and [`ToolResult`]
//! for capturing bounded, structured output.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Result, ToolError};

/// Result of a tool execution.
///
/// `output` carries the tool's JSON result on success. Failures carry a
/// message in `error` and a null `output`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// Tool output (bounded by [`ToolResult::bounded`]).
    pub output: serde_json::Value,
    /// Error message if the tool execution failed.
    pub error: Option<String>,
    /// Whether the output was truncated to fit the output cap.
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result with an error message.
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error),
            truncated: false,
        }
    }

    /// Cap the serialized output at `max_bytes`.
    ///
    /// Output that fits is left as JSON. Output that does not is replaced
    /// by its serialized text cut at a UTF-8 boundary, with a marker.
    #[must_use]
    pub fn bounded(mut self, max_bytes: usize) -> Self {
        let serialized = self.output.to_string();
        let (text, was_truncated) = truncate_output(&serialized, max_bytes);
        if was_truncated {
            self.output = serde_json::Value::String(text);
            self.truncated = true;
        }
        self
    }
}

/// Serialize a tool's result value.
///
/// # Errors
///
/// Returns [`ToolError::Execution`] if `value` cannot be represented as JSON.
pub fn to_output<T: Serialize>(value: &T) -> Result<ToolResult> {
    serde_json::to_value(value)
        .map(ToolResult::success)
        .map_err(|e| ToolError::Execution(format!("failed to serialize tool output: {e}")))
}

/// Truncate a string to at most `max_bytes`, respecting UTF-8 boundaries.
///
/// Returns `(truncated_string, was_truncated)`.
pub fn truncate_output(s: &str, max_bytes: usize) -> (String, bool) {
    if s.len() <= max_bytes {
        return (s.to_string(), false);
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    let truncated = &s[..end];
    (
        format!("{truncated}\n\n[output truncated at {max_bytes} bytes]"),
        true,
    )
}

/// A callable tool.
///
/// Tools are `Send + Sync` and shared behind `Arc` by the registry.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Canonical dotted name, e.g. `web.search`.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] for validation or execution failures; the
    /// registry turns these into failure results.
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}
