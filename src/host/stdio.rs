//! Stdin/stdout JSON bridge for the host command channel.
//!
//! Reads newline-delimited JSON `CommandEnvelope` messages, dispatches them
//! through the [`HostCommandServer`](crate::host::channel::HostCommandServer)
//! router, and writes one `ResponseEnvelope` line per command.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::{Result, ToolError};
use crate::host::channel::{HostCommandClient, command_channel};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::tools::ToolRegistry;

/// Request id used in responses to lines that are not valid envelopes.
pub const PARSE_ERROR_ID: &str = "parse-error";

/// Run the bridge over the process's stdin and stdout until stdin closes
/// or a `runtime.stop` command is received.
///
/// # Errors
///
/// Reading stdin or writing stdout failed.
pub async fn run_stdio_bridge(registry: Arc<ToolRegistry>, request_capacity: usize) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = BufWriter::new(tokio::io::stdout());
    serve(registry, request_capacity, stdin, stdout).await
}

/// Run the bridge over arbitrary line-oriented streams.
///
/// The router runs as its own task; it exits once the reader finishes
/// and drops the client.
///
/// # Errors
///
/// Reading `input` or writing `output` failed.
pub async fn serve<R, W>(
    registry: Arc<ToolRegistry>,
    request_capacity: usize,
    input: R,
    output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (client, server) = command_channel(request_capacity, registry);
    let server_handle = tokio::spawn(server.run());

    let reader_result = run_reader(client, input, output).await;

    if let Err(e) = server_handle.await {
        tracing::warn!(error = %e, "host command server task failed");
    }
    reader_result
}

/// Read line-by-line, dispatch each command, and write responses.
async fn run_reader<R, W>(client: HostCommandClient, mut input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = input
            .read_line(&mut line)
            .await
            .map_err(|e| ToolError::Protocol(format!("failed to read from stdin: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    PARSE_ERROR_ID,
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&mut output, &response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::RuntimeStop;
        let request_id = envelope.request_id.clone();
        tracing::debug!(request_id, command = envelope.command.as_str(), "command received");

        let response = match client.send(envelope).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "host command dispatch failed");
                ResponseEnvelope::error(request_id, e.to_string())
            }
        };
        write_response(&mut output, &response).await?;

        if is_stop {
            tracing::info!("runtime.stop received; shutting down stdio bridge");
            break;
        }
    }

    Ok(())
}

/// Write a single JSON line and flush.
async fn write_response<W>(writer: &mut W, response: &ResponseEnvelope) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)
        .map_err(|e| ToolError::Protocol(format!("failed to serialize response envelope: {e}")))?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
