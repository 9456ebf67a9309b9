//! Host command channel and router.
//!
//! The [`HostCommandClient`] hands envelopes to the [`HostCommandServer`]
//! over a bounded channel; the server routes each one and replies through
//! a oneshot.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, ToolError};
use crate::host::contract::{CONTRACT_VERSION, CommandEnvelope, CommandName, ResponseEnvelope, ToolCall};
use crate::tools::ToolRegistry;

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<ResponseEnvelope>,
}

/// Sending half: validates envelopes and awaits their responses.
#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
}

impl HostCommandClient {
    /// Dispatch `envelope` and wait for its response.
    ///
    /// # Errors
    ///
    /// [`ToolError::Protocol`] for an invalid envelope or a closed channel.
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate().map_err(|e| {
            ToolError::Protocol(format!(
                "invalid host command envelope {}: {}",
                envelope.request_id, e
            ))
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| ToolError::Protocol(format!("failed to send host command request: {e}")))?;

        response_rx
            .await
            .map_err(|e| ToolError::Protocol(format!("host command response dropped: {e}")))
    }
}

/// Receiving half: routes commands to the tool registry.
pub struct HostCommandServer {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    registry: Arc<ToolRegistry>,
}

/// Create a connected client/server pair.
#[must_use]
pub fn command_channel(
    request_capacity: usize,
    registry: Arc<ToolRegistry>,
) -> (HostCommandClient, HostCommandServer) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));
    (
        HostCommandClient { request_tx },
        HostCommandServer {
            request_rx,
            registry,
        },
    )
}

impl HostCommandServer {
    /// Serve until every client is dropped.
    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            let request_id = request.envelope.request_id.clone();
            let response = self
                .route(&request.envelope)
                .await
                .unwrap_or_else(|e| ResponseEnvelope::error(request_id, e.to_string()));
            let _ = request.response_tx.send(response);
        }
    }

    /// Route a command envelope to the appropriate handler.
    ///
    /// # Errors
    ///
    /// Malformed `tools.call` payloads and unknown tool names.
    pub async fn route(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        match envelope.command {
            CommandName::HostPing => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"pong": true}),
            )),
            CommandName::HostVersion => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "contract_version": CONTRACT_VERSION,
                }),
            )),
            CommandName::ToolsList => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"tools": self.registry.schemas()}),
            )),
            CommandName::ToolsCall => self.handle_tools_call(envelope).await,
            CommandName::RuntimeStop => Ok(ResponseEnvelope::ok(
                envelope.request_id.clone(),
                serde_json::json!({"stopping": true}),
            )),
        }
    }

    async fn handle_tools_call(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let call: ToolCall = serde_json::from_value(envelope.payload.clone()).map_err(|e| {
            ToolError::Validation(format!("tools.call payload needs a name: {e}"))
        })?;

        let result = self.registry.call(&call.name, call.arguments).await?;
        let mut payload = serde_json::to_value(&result)
            .map_err(|e| ToolError::Protocol(format!("failed to serialize tool result: {e}")))?;
        if let Some(object) = payload.as_object_mut() {
            object.insert("name".into(), serde_json::Value::String(call.name));
        }
        Ok(ResponseEnvelope::ok(envelope.request_id.clone(), payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "text.upper"
        }
        fn description(&self) -> &str {
            "Upper-case text"
        }
        fn schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
            let text = crate::tools::args::required_str(&args, "text")?;
            Ok(ToolResult::success(json!(text.to_uppercase())))
        }
    }

    fn server() -> (HostCommandClient, HostCommandServer) {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(UpperTool));
        command_channel(4, Arc::new(registry))
    }

    #[tokio::test]
    async fn ping_pongs() {
        let (_client, server) = server();
        let resp = server
            .route(&CommandEnvelope::new("r1", CommandName::HostPing, json!({})))
            .await
            .expect("route");
        assert!(resp.ok);
        assert_eq!(resp.payload, json!({"pong": true}));
    }

    #[tokio::test]
    async fn version_reports_package() {
        let (_client, server) = server();
        let resp = server
            .route(&CommandEnvelope::new("r2", CommandName::HostVersion, json!({})))
            .await
            .expect("route");
        assert_eq!(resp.payload["name"], "tool4lm");
        assert_eq!(resp.payload["contract_version"], CONTRACT_VERSION);
    }

    #[tokio::test]
    async fn list_returns_schemas() {
        let (_client, server) = server();
        let resp = server
            .route(&CommandEnvelope::new("r3", CommandName::ToolsList, json!({})))
            .await
            .expect("route");
        assert_eq!(resp.payload["tools"][0]["name"], "text.upper");
        assert_eq!(resp.payload["tools"][0]["alias"], "text_upper");
    }

    #[tokio::test]
    async fn call_returns_tool_result() {
        let (_client, server) = server();
        let resp = server
            .route(&CommandEnvelope::new(
                "r4",
                CommandName::ToolsCall,
                json!({"name": "text_upper", "arguments": {"text": "xin chào"}}),
            ))
            .await
            .expect("route");
        assert!(resp.ok);
        assert_eq!(resp.payload["name"], "text_upper");
        assert_eq!(resp.payload["success"], true);
        assert_eq!(resp.payload["output"], "XIN CHÀO");
    }

    #[tokio::test]
    async fn tool_failure_is_an_ok_envelope() {
        let (_client, server) = server();
        let resp = server
            .route(&CommandEnvelope::new(
                "r5",
                CommandName::ToolsCall,
                json!({"name": "text.upper", "arguments": {}}),
            ))
            .await
            .expect("route");
        assert!(resp.ok);
        assert_eq!(resp.payload["success"], false);
        assert!(resp.payload["error"].as_str().is_some_and(|e| e.contains("text")));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let (_client, server) = server();
        let err = server
            .route(&CommandEnvelope::new(
                "r6",
                CommandName::ToolsCall,
                json!({"name": "doc.find"}),
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown tool"));
    }

    #[tokio::test]
    async fn client_round_trip_keeps_request_id_on_errors() {
        let (client, server) = server();
        let handle = tokio::spawn(server.run());

        let resp = client
            .send(CommandEnvelope::new("r7", CommandName::ToolsCall, json!({})))
            .await
            .expect("send");
        assert!(!resp.ok);
        assert_eq!(resp.request_id, "r7");

        drop(client);
        handle.await.expect("server exits when the client is dropped");
    }

    #[tokio::test]
    async fn client_rejects_invalid_envelope() {
        let (client, _server) = server();
        let mut envelope = CommandEnvelope::new("r8", CommandName::HostPing, json!({}));
        envelope.v = 0;
        let err = client.send(envelope).await.unwrap_err();
        assert!(matches!(err, ToolError::Protocol(_)));
    }
}
