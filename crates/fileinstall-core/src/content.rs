//! Decoding of configuration files into dictionaries

use crate::resource::{ConfigFormat, Dictionary};
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;

/// Decode the bytes of a configuration file.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the bytes are not UTF-8 or do not form a
/// document of the expected shape. Callers treat this as transient: a file
/// that is still being written decodes fine on a later poll.
pub fn decode_config(format: ConfigFormat, bytes: &[u8], path: &Path) -> Result<Dictionary> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match format {
        ConfigFormat::Json => decode_json(text, path),
        ConfigFormat::Properties => Ok(decode_properties(text)),
    }
}

fn decode_json(text: &str, path: &Path) -> Result<Dictionary> {
    // Blank out comment lines instead of dropping them so error positions stay accurate
    let stripped: String = text
        .lines()
        .map(|line| if line.trim_start().starts_with("//") { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n");

    let value: Value = serde_json::from_str(&stripped).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Decode {
            path: path.to_path_buf(),
            message: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `key=value` / `key: value` lines; `#` and `!` start comments, a trailing
/// backslash continues the logical line.
fn decode_properties(text: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim_start();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        if ends_with_continuation(line) {
            pending.push_str(&line[..line.len() - 1]);
            continue;
        }
        pending.push_str(line);

        let (key, value) = split_entry(&pending);
        if !key.is_empty() {
            dict.insert(key, Value::String(value));
        }
        pending.clear();
    }

    if !pending.is_empty() {
        let (key, value) = split_entry(&pending);
        if !key.is_empty() {
            dict.insert(key, Value::String(value));
        }
    }

    dict
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' | ':' if !escaped => {
                let key = unescape(line[..idx].trim_end());
                let value = unescape(line[idx + 1..].trim_start());
                return (key, value);
            }
            _ => escaped = false,
        }
    }
    (unescape(line.trim_end()), String::new())
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
