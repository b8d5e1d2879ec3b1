//! Format-agnostic loading of property files

use crate::{Error, NormalizedPath, Result, io};
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat `dotted.key -> value` map.
pub type Properties = BTreeMap<String, String>;

/// Format-agnostic property store.
///
/// Detects the format from the file extension and flattens the document
/// into dotted keys, so
///
/// ```toml
/// [fileinstall]
/// dir = ["/srv/a", "/srv/b"]
/// interval = 500
/// ```
///
/// yields `fileinstall.dir = "/srv/a,/srv/b"` and `fileinstall.interval = "500"`.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load a property file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load(&self, path: &NormalizedPath) -> Result<Properties> {
        let content = io::read_text(path)?;
        let extension = path.extension().unwrap_or("");

        let document: Value = match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "TOML".into(),
                message: e.to_string(),
            })?,
            "json" => serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "JSON".into(),
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "YAML".into(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(Error::UnsupportedFormat {
                    extension: extension.to_string(),
                });
            }
        };

        let mut properties = Properties::new();
        flatten("", &document, &mut properties);
        Ok(properties)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut Properties) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, child, out);
            }
        }
        Value::Null => {}
        other => {
            if let Some(text) = scalar_text(other) {
                out.insert(prefix.to_string(), text);
            }
        }
    }
}

/// Arrays of scalars become comma-separated lists; nested containers are dropped.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_array() && !item.is_object())
                .filter_map(scalar_text)
                .collect();
            Some(parts.join(","))
        }
        Value::Null | Value::Object(_) => None,
    }
}
