//! Workflow output emission.
//!
//! Resolved results are flattened to `key_field=value` pairs, logged, and
//! appended to the output file the CI runner designates via the
//! `GITHUB_OUTPUT` environment variable (when set).

pub mod docker;
pub mod oci;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RelverError, Result};
use crate::ui;

/// Delimiter for multi-line values in the output file
const HEREDOC_DELIMITER: &str = "__RELVER_OUTPUT__";

/// Flatten a serialized value into `key` / `key_field` pairs.
///
/// Nulls are skipped, nested objects recurse with `_`-joined keys, and
/// arrays are rejected: the output surface is flat key/value only.
pub fn flatten_outputs(key: &str, value: &Value, out: &mut Vec<(String, String)>) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (field, nested) in map {
                flatten_outputs(&format!("{}_{}", key, field), nested, out)?;
            }
        }
        Value::Array(_) => {
            return Err(RelverError::config(format!(
                "Array types are not supported for output '{}'",
                key
            )));
        }
        Value::String(s) => out.push((key.to_string(), s.clone())),
        other => out.push((key.to_string(), other.to_string())),
    }
    Ok(())
}

/// Destination for workflow outputs
pub struct OutputSink {
    github_output: Option<PathBuf>,
}

impl OutputSink {
    /// Sink writing to the file named by `GITHUB_OUTPUT`, or log-only when
    /// the variable is absent or empty
    pub fn from_env() -> Self {
        let github_output = std::env::var("GITHUB_OUTPUT")
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        OutputSink { github_output }
    }

    /// Sink writing to an explicit file (tests)
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        OutputSink {
            github_output: Some(path.into()),
        }
    }

    /// Log-only sink
    pub fn log_only() -> Self {
        OutputSink {
            github_output: None,
        }
    }

    /// Emit a single key/value pair
    pub fn emit(&self, key: &str, value: &str) -> Result<()> {
        ui::display_info(&format!("{}={}", key, value));

        let Some(path) = &self.github_output else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if value.contains('\n') {
            writeln!(
                file,
                "{}<<{}\n{}\n{}",
                key, HEREDOC_DELIMITER, value, HEREDOC_DELIMITER
            )?;
        } else {
            writeln!(file, "{}={}", key, value)?;
        }
        Ok(())
    }

    /// Serialize `value` and emit each flattened pair under `key`
    pub fn emit_object<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value)
            .map_err(|e| RelverError::config(format!("Cannot serialize output '{}': {}", key, e)))?;

        let mut pairs = Vec::new();
        flatten_outputs(key, &json, &mut pairs)?;
        for (key, value) in pairs {
            self.emit(&key, &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_primitives() {
        let mut out = Vec::new();
        flatten_outputs("ver", &json!({"major": 1, "tag": "edge"}), &mut out).unwrap();
        assert!(out.contains(&("ver_major".to_string(), "1".to_string())));
        assert!(out.contains(&("ver_tag".to_string(), "edge".to_string())));
    }

    #[test]
    fn test_flatten_nested_objects() {
        let mut out = Vec::new();
        flatten_outputs("a", &json!({"b": {"c": true}}), &mut out).unwrap();
        assert_eq!(out, vec![("a_b_c".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_flatten_skips_null() {
        let mut out = Vec::new();
        flatten_outputs("a", &json!({"b": null, "c": 2}), &mut out).unwrap();
        assert_eq!(out, vec![("a_c".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_flatten_rejects_arrays() {
        let mut out = Vec::new();
        let err = flatten_outputs("a", &json!({"b": [1, 2]}), &mut out).unwrap_err();
        assert!(err.to_string().contains("Array types are not supported"));
    }

    #[test]
    fn test_flatten_scalar_at_top_level() {
        let mut out = Vec::new();
        flatten_outputs("release_tag", &json!("1.2.3"), &mut out).unwrap();
        assert_eq!(out, vec![("release_tag".to_string(), "1.2.3".to_string())]);
    }
}
