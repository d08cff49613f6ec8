//! Canonical byte form of a generated document, for external signers.
//!
//! JSON documents lose every `signature`/`signatures` member and are
//! re-serialized compactly with lexicographically sorted keys. Tag-value
//! documents lose blank, comment and `Signature:` lines and get `\n` line
//! endings.

use serde_json::Value;

use crate::error::{BinsbomError, GenerationErrorKind, Result};

const SIGNATURE_KEYS: [&str; 2] = ["signature", "signatures"];

/// Canonicalize a CycloneDX, SPDX 3 or SPDX 2.3 tag-value document.
pub fn canonicalize(document: &str) -> Result<Vec<u8>> {
    let trimmed = document.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed).map_err(|e| {
            BinsbomError::generation(
                "canonicalizing JSON document",
                GenerationErrorKind::Canonicalization(e.to_string()),
            )
        })?;
        let mut out = String::with_capacity(document.len());
        write_value(&mut out, &value)?;
        Ok(out.into_bytes())
    } else if trimmed.starts_with("SPDXVersion:") {
        Ok(canonicalize_tag_value(trimmed).into_bytes())
    } else {
        Err(BinsbomError::generation(
            "canonicalizing document",
            GenerationErrorKind::Canonicalization(
                "neither JSON nor SPDX tag-value".to_string(),
            ),
        ))
    }
}

fn canonicalize_tag_value(document: &str) -> String {
    let mut out = String::with_capacity(document.len());
    for line in document.lines() {
        let line = line.trim_end_matches('\r');
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') || content.starts_with("Signature:") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|k| !SIGNATURE_KEYS.contains(&k.as_str()))
                .collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&encode_string(key)?);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_value(out, v)?;
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::String(s) => out.push_str(&encode_string(s)?),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => out.push_str("null"),
    }
    Ok(())
}

fn encode_string(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| {
        BinsbomError::generation(
            "encoding JSON string",
            GenerationErrorKind::Canonicalization(e.to_string()),
        )
    })
}
