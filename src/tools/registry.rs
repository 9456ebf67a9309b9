//! Tool registry with underscore aliases.
//!
//! The [`ToolRegistry`] holds registered tools, resolves both the dotted
//! name (`web.search`) and its underscore alias (`web_search`), bounds
//! every output, and exports schemas for `tools.list`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DEFAULT_MAX_OUTPUT_BYTES;
use crate::error::{Result, ToolError};

use super::types::{Tool, ToolResult};

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    aliases: HashMap<String, String>,
    max_output_bytes: usize,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("max_output_bytes", &self.max_output_bytes)
            .finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl ToolRegistry {
    /// Create an empty registry capping output at `max_output_bytes`.
    pub fn new(max_output_bytes: usize) -> Self {
        Self {
            tools: HashMap::new(),
            aliases: HashMap::new(),
            max_output_bytes,
        }
    }

    /// Register a tool under its name and, for dotted names, the
    /// underscore alias. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let alias = name.replace('.', "_");
        if alias != name {
            self.aliases.insert(alias, name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Get a tool by canonical name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let canonical = self.aliases.get(name).map_or(name, String::as_str);
        self.tools.get(canonical).cloned()
    }

    /// Canonical names of all registered tools, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check if a tool exists under `name` or an alias.
    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Export `{ name, alias, description, parameters }` for every tool,
    /// sorted by name.
    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "alias": t.name().replace('.', "_"),
                    "description": t.description(),
                    "parameters": t.schema(),
                })
            })
            .collect()
    }

    /// Run the tool named `name`.
    ///
    /// Tool errors become failure results; output is capped.
    ///
    /// # Errors
    ///
    /// Only [`ToolError::Validation`] for an unknown tool name.
    pub async fn call(&self, name: &str, args: serde_json::Value) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::Validation(format!("unknown tool: {name}")))?;

        tracing::debug!(tool = tool.name(), "tool call");
        let result = match tool.execute(args).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(tool = tool.name(), error = %err, "tool call failed");
                ToolResult::failure(err.to_string())
            }
        };
        Ok(result.bounded(self.max_output_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "test.echo"
        }
        fn description(&self) -> &str {
            "Echo arguments"
        }
        fn schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
            Ok(ToolResult::success(args))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult> {
            Err(ToolError::Validation("missing required argument: q".into()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(FailingTool));
        registry
    }

    #[test]
    fn lookup_by_name_and_alias() {
        let registry = registry();
        assert!(registry.exists("test.echo"));
        assert!(registry.exists("test_echo"));
        assert!(registry.exists("fail"));
        assert!(!registry.exists("test-echo"));
    }

    #[test]
    fn names_are_canonical_and_sorted() {
        assert_eq!(registry().names(), vec!["fail", "test.echo"]);
    }

    #[test]
    fn schemas_carry_alias() {
        let schemas = registry().schemas();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[1]["name"], "test.echo");
        assert_eq!(schemas[1]["alias"], "test_echo");
        assert_eq!(schemas[1]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn call_through_alias() {
        let result = registry()
            .call("test_echo", json!({"x": 1}))
            .await
            .expect("known tool");
        assert!(result.success);
        assert_eq!(result.output, json!({"x": 1}));
    }

    #[tokio::test]
    async fn tool_errors_become_failures() {
        let result = registry().call("fail", json!({})).await.expect("known tool");
        assert!(!result.success);
        assert!(result.error.as_deref().is_some_and(|e| e.contains("missing required")));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let err = registry().call("calc.eval", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("unknown tool: calc.eval"));
    }

    #[tokio::test]
    async fn output_is_capped() {
        let mut registry = ToolRegistry::new(16);
        registry.register(Arc::new(EchoTool));
        let result = registry
            .call("test.echo", json!({"text": "long enough to exceed the cap"}))
            .await
            .expect("known tool");
        assert!(result.truncated);
        assert!(result.output.is_string());
    }
}
