//! Error types for the tool layer and host bridge.

use tool4lm_web::{FetchErrorKind, WebError};

/// Top-level error type for tools, configuration, and the host bridge.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool arguments were missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The tool ran but could not produce a result.
    #[error("execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host protocol or channel error.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<WebError> for ToolError {
    fn from(err: WebError) -> Self {
        let message = format!("[{}] {err}", err.code());
        match err {
            WebError::InvalidQuery(_) => Self::Validation(message),
            WebError::Fetch {
                kind: FetchErrorKind::InvalidUrl,
                ..
            } => Self::Validation(message),
            WebError::Config(_) => Self::Config(message),
            _ => Self::Execution(message),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ToolError>;
