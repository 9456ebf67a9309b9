//! Argument extraction for tool calls.
//!
//! Clients generate arguments loosely, so numbers are also accepted as
//! numeric strings and lists as comma-separated strings.

use serde_json::Value;

use crate::error::{Result, ToolError};

/// A required, non-blank string argument, trimmed.
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    optional_str(args, key)?
        .ok_or_else(|| ToolError::Validation(format!("missing required argument: {key}")))
}

/// An optional string argument, trimmed. Blank counts as absent.
pub fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then_some(trimmed))
        }
        Some(_) => Err(ToolError::Validation(format!("{key} must be a string"))),
    }
}

/// The first of `keys` that is present, as a non-negative integer.
pub fn optional_u64(args: &Value, keys: &[&str]) -> Result<Option<u64>> {
    for key in keys {
        let parsed = match args.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        return parsed
            .map(Some)
            .ok_or_else(|| ToolError::Validation(format!("{key} must be a non-negative integer")));
    }
    Ok(None)
}

/// A list of non-blank strings from an array or a comma-separated string.
pub fn string_list(args: &Value, key: &str) -> Result<Vec<String>> {
    let items: Vec<&str> = match args.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) => s.split(',').collect(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| ToolError::Validation(format!("{key} must contain strings")))
            })
            .collect::<Result<_>>()?,
        Some(_) => {
            return Err(ToolError::Validation(format!(
                "{key} must be an array of strings"
            )));
        }
    };
    Ok(items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
