//! Headless tool host for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin
//! and writes one `ResponseEnvelope` per command to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use std::sync::Arc;

use tool4lm::Tool4lmConfig;
use tool4lm::host::stdio::run_stdio_bridge;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG`, else `LOG_LEVEL`, else `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .init();

    let config = Tool4lmConfig::load().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        anyhow::anyhow!("tool4lm-host failed to load configuration: {e}")
    })?;

    let registry = Arc::new(tool4lm::registry_for(&config));
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tools = registry.names().len(),
        engines = ?config.web.engine_order,
        "tool4lm-host starting"
    );

    run_stdio_bridge(registry, config.host.request_capacity)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "tool4lm-host exited with error");
            anyhow::anyhow!("tool4lm-host failed: {e}")
        })?;

    tracing::info!("tool4lm-host shut down cleanly");
    Ok(())
}
