//! Process configuration: TOML file plus environment overrides.
//!
//! The file lives at `$TOOL4LM_CONFIG` or `<config dir>/tool4lm/config.toml`;
//! a missing file means defaults. Environment variables then override the
//! most commonly tuned web settings.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tool4lm_web::WebConfig;

use crate::error::{Result, ToolError};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TOOL4LM_CONFIG";

/// Default cap on serialized tool output (100 KB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Host bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Pending requests buffered between the stdin reader and the router.
    pub request_capacity: usize,
    /// Serialized tool output above this many bytes is truncated.
    pub max_output_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            request_capacity: 64,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool4lmConfig {
    pub web: WebConfig,
    pub host: HostConfig,
}

impl Tool4lmConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ToolError::Config(format!("{}: {e}", path.display())))
    }

    /// Returns the default config file path: `<config dir>/tool4lm/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("tool4lm").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("/tmp/tool4lm-config/config.toml"))
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed file, unparseable override, or invalid result.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`Tool4lmConfig::load`].
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        let mut config = if path.exists() {
            tracing::debug!(path = %path.display(), "loading config file");
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides. Blank values are ignored.
    ///
    /// `ENGINE_ORDER` and `SEARXNG_ENDPOINTS` are comma-separated lists.
    ///
    /// # Errors
    ///
    /// A numeric override that does not parse.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("ENGINE_ORDER") {
            self.web.engine_order = split_list(&raw)
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect();
        }
        if let Some(raw) = get("SEARXNG_ENDPOINTS") {
            self.web.searxng_endpoints = split_list(&raw);
        }
        if let Some(raw) = get("LANG_DEFAULT") {
            self.web.lang_default = raw.trim().to_string();
        }
        if let Some(raw) = get("REGION_DEFAULT") {
            self.web.region_default = raw.trim().to_string();
        }
        if let Some(raw) = get("MAX_FETCH_BYTES") {
            self.web.max_fetch_bytes = parse_number("MAX_FETCH_BYTES", &raw)?;
        }
        if let Some(raw) = get("FETCH_TIMEOUT_MS") {
            self.web.fetch_timeout_ms = parse_number("FETCH_TIMEOUT_MS", &raw)?;
        }
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Any web setting rejected by [`WebConfig::validate`], or a zero host limit.
    pub fn validate(&self) -> Result<()> {
        self.web
            .validate()
            .map_err(|e| ToolError::Config(e.to_string()))?;
        if self.host.request_capacity == 0 {
            return Err(ToolError::Config(
                "host.request_capacity must be greater than 0".into(),
            ));
        }
        if self.host.max_output_bytes == 0 {
            return Err(ToolError::Config(
                "host.max_output_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ToolError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}
