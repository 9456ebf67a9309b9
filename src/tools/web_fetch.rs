//! `web.fetch`: one guarded, bounded GET.
//!
//! Caller overrides for `timeout` and `max_bytes` can only tighten the
//! process-wide limits, never loosen them.

use std::time::Duration;

use async_trait::async_trait;
use tool4lm_web::{FetchBudget, FetchRequest, Fetcher, WebConfig};

use crate::error::{Result, ToolError};

use super::args::{optional_u64, required_str};
use super::types::{Tool, ToolResult, to_output};

/// Tool that fetches a URL with size and time limits.
///
/// # Arguments (JSON)
///
/// - `url` (string, required): absolute http(s) URL
/// - `timeout` (integer, optional): milliseconds, clamped to the default
/// - `max_bytes` (integer, optional): body cap, clamped to the default
pub struct WebFetchTool {
    fetcher: Fetcher,
    limits: FetchBudget,
}

impl WebFetchTool {
    pub fn new(config: &WebConfig, fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            limits: config.fetch_budget(),
        }
    }

    /// Effective budget after applying caller overrides.
    fn budget(&self, args: &serde_json::Value) -> Result<FetchBudget> {
        let timeout_ms = optional_u64(args, &["timeout", "timeout_ms"])?
            .map_or(self.limits.timeout_ms, |t| t.min(self.limits.timeout_ms));
        let max_bytes = optional_u64(args, &["max_bytes"])?
            .map_or(self.limits.max_bytes, |b| {
                usize::try_from(b).map_or(self.limits.max_bytes, |b| b.min(self.limits.max_bytes))
            });
        if timeout_ms == 0 {
            return Err(ToolError::Validation("timeout must be greater than 0".into()));
        }
        if max_bytes == 0 {
            return Err(ToolError::Validation("max_bytes must be greater than 0".into()));
        }
        Ok(FetchBudget::new(timeout_ms, max_bytes))
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web.fetch"
    }

    fn description(&self) -> &str {
        "Fetch a URL with size/time limits and anti-SSRF."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL to fetch"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (cannot exceed the server default)"
                },
                "max_bytes": {
                    "type": "integer",
                    "description": "Maximum body bytes (cannot exceed the server default)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let url = required_str(&args, "url")?;
        let budget = self.budget(&args)?;
        let request = FetchRequest::new(
            url,
            Duration::from_millis(budget.timeout_ms),
            budget.max_bytes,
        )?;

        let page = tool4lm_web::fetch_page(&self.fetcher, &request).await?;
        tracing::debug!(status = page.status, content_type = %page.content_type, "web.fetch done");
        to_output(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool() -> WebFetchTool {
        let config = WebConfig::default();
        WebFetchTool::new(&config, Fetcher::new(&config))
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let budget = tool().budget(&json!({"url": "https://example.com"})).expect("budget");
        assert_eq!(budget, WebConfig::default().fetch_budget());
    }

    #[test]
    fn overrides_only_tighten() {
        let tool = tool();
        let tighter = tool
            .budget(&json!({"timeout": 500, "max_bytes": 1024}))
            .expect("budget");
        assert_eq!(tighter, FetchBudget::new(500, 1024));

        let looser = tool
            .budget(&json!({"timeout": 600_000, "max_bytes": 1_000_000_000u64}))
            .expect("budget");
        assert_eq!(looser, WebConfig::default().fetch_budget());
    }

    #[test]
    fn zero_override_is_rejected() {
        assert!(tool().budget(&json!({"timeout": 0})).is_err());
        assert!(tool().budget(&json!({"max_bytes": 0})).is_err());
    }

    #[tokio::test]
    async fn missing_url_is_validation_error() {
        let err = tool().execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn non_http_url_is_validation_error() {
        let err = tool()
            .execute(json!({"url": "file:///etc/passwd"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn private_address_is_refused() {
        let err = tool()
            .execute(json!({"url": "http://192.168.1.1/admin"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("blocked_address"));
    }
}
