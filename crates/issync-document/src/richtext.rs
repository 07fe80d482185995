//! Extraction, validation, and rendering of the single embedded `jira-adf`
//! fenced block.
//!
//! The stored [`serde_json::Value`] is always a freshly-built three-key
//! object so that callers can rely on field presence; rendering reads it back
//! by key rather than iterating the map, which sidesteps `serde_json`'s
//! default (alphabetical) key ordering and lets us emit the canonical
//! `{version, type, content}` order without a `preserve_order` feature.

use serde_json::{Map, Value};

use crate::error::ParseError;

const FENCE_OPEN: &str = "```jira-adf";
const FENCE_CLOSE: &str = "```";

/// Build the canonical `{version:1, type:"doc", content}` object.
pub fn canonical_rich_text(content: Value) -> Value {
    let mut map = Map::new();
    map.insert("version".to_string(), Value::from(1));
    map.insert("type".to_string(), Value::from("doc"));
    map.insert("content".to_string(), content);
    Value::Object(map)
}

/// Validate that `raw` parses as a `jira-adf` object shaped
/// `{"version":1,"type":"doc","content":...}` and return its canonical form.
pub fn parse_rich_text(raw: &str) -> Result<Value, ParseError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ParseError::MalformedRawBlock(format!("invalid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::MalformedRawBlock("expected a JSON object".to_string()))?;

    let version = object
        .get("version")
        .and_then(Value::as_i64)
        .ok_or_else(|| ParseError::MalformedRawBlock("missing or non-integer \"version\"".to_string()))?;
    if version != 1 {
        return Err(ParseError::MalformedRawBlock(format!("unsupported version: {version}")));
    }

    let doc_type = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::MalformedRawBlock("missing or non-string \"type\"".to_string()))?;
    if doc_type != "doc" {
        return Err(ParseError::MalformedRawBlock(format!("unsupported type: {doc_type:?}")));
    }

    let content = object
        .get("content")
        .ok_or_else(|| ParseError::MalformedRawBlock("missing \"content\"".to_string()))?
        .clone();

    Ok(canonical_rich_text(content))
}

/// Render the fenced `jira-adf` block (without surrounding blank lines).
pub fn render_rich_text_block(value: &Value) -> String {
    let content = value.get("content").cloned().unwrap_or(Value::Null);
    let compact = serde_json::to_string(&content).expect("content is already-validated JSON");
    format!("{FENCE_OPEN}\n{{\"version\":1,\"type\":\"doc\",\"content\":{compact}}}\n{FENCE_CLOSE}")
}

/// Locate and extract the single `jira-adf` fenced block from `body`,
/// returning the remaining body text (with the block and its surrounding
/// blank lines removed) and the parsed, canonicalized rich-text value.
///
/// More than one such block is a hard parse error.
pub fn extract_rich_text(body: &str) -> Result<(String, Option<Value>), ParseError> {
    let lines: Vec<&str> = body.lines().collect();

    let mut fence_start = None;
    let mut fence_end = None;
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim_end() == FENCE_OPEN {
            if fence_start.is_some() {
                return Err(ParseError::MalformedRawBlock("more than one jira-adf block".to_string()));
            }
            let close = lines[i + 1..]
                .iter()
                .position(|l| l.trim_end() == FENCE_CLOSE)
                .map(|offset| i + 1 + offset)
                .ok_or_else(|| ParseError::MalformedRawBlock("unterminated jira-adf fence".to_string()))?;
            fence_start = Some(i);
            fence_end = Some(close);
            i = close + 1;
        } else {
            i += 1;
        }
    }

    let (Some(start), Some(end)) = (fence_start, fence_end) else {
        return Ok((body.to_string(), None));
    };

    let json_text = lines[start + 1..end].join("\n");
    let rich_text = parse_rich_text(&json_text)?;

    let mut remaining: Vec<&str> = Vec::with_capacity(lines.len());
    remaining.extend_from_slice(&lines[..start]);
    remaining.extend_from_slice(&lines[end + 1..]);
    while remaining.last().is_some_and(|l| l.trim().is_empty()) {
        remaining.pop();
    }
    while remaining.first().is_some_and(|l| l.trim().is_empty()) {
        remaining.remove(0);
    }

    Ok((remaining.join("\n"), Some(rich_text)))
}
