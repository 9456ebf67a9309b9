//! Error types for the tool4lm-web crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Fetch failures carry a [`FetchErrorKind`] so
//! callers can tell a timeout from a refused connection without parsing
//! the message.

use std::fmt;

/// Category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The URL did not parse, had no host, or used a scheme other than http(s).
    InvalidUrl,
    /// Hostname resolution failed or returned no addresses.
    Dns,
    /// The overall wall-clock budget elapsed.
    Timeout,
    /// More redirects than the configured cap.
    RedirectLimit,
    /// Connection, TLS, or body read failure.
    Transport,
}

impl FetchErrorKind {
    /// Stable lowercase name, used in tool failure payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Dns => "dns",
            Self::Timeout => "timeout",
            Self::RedirectLimit => "redirect_limit",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during fetch and search operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The target resolved to a private, loopback, or link-local address.
    #[error("blocked address: {0}")]
    BlockedAddress(String),

    /// A single fetch failed. Never retried internally.
    #[error("fetch error ({kind}): {message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },

    /// A backend response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The search query was rejected before any backend was consulted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl WebError {
    /// Shorthand for a [`WebError::Fetch`] of the given kind.
    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            message: message.into(),
        }
    }

    /// Returns the fetch kind if this is a [`WebError::Fetch`].
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Stable short code for structured failure payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlockedAddress(_) => "blocked_address",
            Self::Fetch { kind, .. } => kind.as_str(),
            Self::Parse(_) => "parse",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Config(_) => "config",
        }
    }
}

/// Convenience type alias for tool4lm-web results.
pub type Result<T> = std::result::Result<T, WebError>;
