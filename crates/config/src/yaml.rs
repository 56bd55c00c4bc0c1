// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML rendering helpers for config documents.

use serde_json::Value;

/// Parse YAML text into a JSON-compatible document.
///
/// An empty or comment-only file parses to an empty mapping so that a fresh
/// config file behaves like a document at version zero.
pub fn from_yaml_str(text: &str) -> Result<Value, serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(text)?;
    if value.is_null() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    Ok(value)
}

/// Render a document as YAML, optionally prefixed with a
/// `# yaml-language-server` schema header for editor tooling.
pub fn to_yaml_string(doc: &Value, schema_url: Option<&str>) -> Result<String, serde_yaml::Error> {
    let body = serde_yaml::to_string(doc)?;
    match schema_url {
        Some(url) => Ok(format!("# yaml-language-server: $schema={url}\n{body}")),
        None => Ok(body),
    }
}

#[cfg(test)]
#[path = "yaml_tests.rs"]
mod tests;
