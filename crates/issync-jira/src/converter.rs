//! A best-effort Markdown <-> Atlassian Document Format converter.
//!
//! Lossless high-fidelity rich-text round-tripping is explicitly out of
//! scope; the planner's description risk gate exists precisely because
//! this conversion can lose information. When the local document still
//! carries its original embedded `jira-adf` block untouched, this converter
//! treats it as authoritative and skips reconstruction entirely; only a
//! document with no raw block (a fresh draft, or one whose author deleted
//! the block) goes through the lossy Markdown-to-ADF path.

use issync_core::ports::{ContentConverter, ConvertError, ConvertedDescription};
use issync_types::ReasonCode;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct AdfConverter;

impl ContentConverter for AdfConverter {
    fn markdown_to_remote(&self, markdown: &str, rich_text: Option<&Value>) -> Result<ConvertedDescription, ConvertError> {
        if let Some(raw) = rich_text {
            return Ok(ConvertedDescription { payload: raw.clone(), risk_codes: Vec::new() });
        }

        let mut content = Vec::new();
        let mut risky = false;
        for block in markdown.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }
            if block.contains('|') || block.starts_with('<') || block.starts_with('#') {
                risky = true;
            }
            content.push(markdown_block_to_adf(block));
        }
        if content.is_empty() {
            content.push(json!({"type": "paragraph", "content": []}));
        }

        let risk_codes = if risky { vec![ReasonCode::DescriptionAdfBlockMalformed] } else { Vec::new() };
        Ok(ConvertedDescription { payload: json!({"version": 1, "type": "doc", "content": content}), risk_codes })
    }

    fn remote_to_markdown(&self, payload: &Value) -> Result<(String, Option<Value>), ConvertError> {
        let content = payload
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| ConvertError::Malformed("description payload has no \"content\" array".to_string()))?;

        let blocks: Vec<String> = content.iter().map(adf_node_to_markdown).collect();
        let markdown = blocks.join("\n\n");
        let raw = json!({"version": 1, "type": "doc", "content": content});
        Ok((markdown, Some(raw)))
    }
}

/// A Markdown block is either a bullet list (every line starts with `- `)
/// or a single paragraph of plain text with `**bold**`/`` `code` `` marks.
fn markdown_block_to_adf(block: &str) -> Value {
    let lines: Vec<&str> = block.lines().collect();
    if !lines.is_empty() && lines.iter().all(|l| l.trim_start().starts_with("- ")) {
        let items: Vec<Value> = lines
            .iter()
            .map(|l| {
                let text = l.trim_start().trim_start_matches("- ").trim();
                json!({"type": "listItem", "content": [{"type": "paragraph", "content": text_runs(text)}]})
            })
            .collect();
        return json!({"type": "bulletList", "content": items});
    }
    json!({"type": "paragraph", "content": text_runs(block)})
}

/// Splits `**bold**` and `` `code` `` spans out of a plain-text run into ADF
/// text nodes carrying the corresponding mark. Anything else is emitted as
/// an unmarked text node.
fn text_runs(text: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(end) = find_wrapped(rest, "**") {
            push_text(&mut nodes, &rest[..end.0]);
            nodes.push(json!({"type": "text", "text": &rest[end.0 + 2..end.1], "marks": [{"type": "strong"}]}));
            rest = &rest[end.1 + 2..];
        } else if let Some(end) = find_wrapped(rest, "`") {
            push_text(&mut nodes, &rest[..end.0]);
            nodes.push(json!({"type": "text", "text": &rest[end.0 + 1..end.1], "marks": [{"type": "code"}]}));
            rest = &rest[end.1 + 1..];
        } else {
            push_text(&mut nodes, rest);
            rest = "";
        }
    }
    if nodes.is_empty() { Vec::new() } else { nodes }
}

fn push_text(nodes: &mut Vec<Value>, text: &str) {
    if !text.is_empty() {
        nodes.push(json!({"type": "text", "text": text}));
    }
}

/// Finds the first `delim ... delim` span in `text`, returning the byte
/// offsets of the opening and closing delimiter.
fn find_wrapped(text: &str, delim: &str) -> Option<(usize, usize)> {
    let start = text.find(delim)?;
    let after = start + delim.len();
    let end = text[after..].find(delim)? + after;
    Some((start, end))
}

fn adf_node_to_markdown(node: &Value) -> String {
    match node.get("type").and_then(Value::as_str) {
        Some("bulletList") => node
            .get("content")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|item| format!("- {}", list_item_text(item))).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default(),
        Some("orderedList") => node
            .get("content")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {}", i + 1, list_item_text(item)))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default(),
        _ => paragraph_text(node),
    }
}

fn list_item_text(item: &Value) -> String {
    item.get("content").and_then(Value::as_array).and_then(|paras| paras.first()).map(paragraph_text).unwrap_or_default()
}

fn paragraph_text(node: &Value) -> String {
    node.get("content")
        .and_then(Value::as_array)
        .map(|runs| runs.iter().map(text_node_to_markdown).collect::<Vec<_>>().join(""))
        .unwrap_or_default()
}

fn text_node_to_markdown(node: &Value) -> String {
    let text = node.get("text").and_then(Value::as_str).unwrap_or_default();
    let has_mark = |name: &str| {
        node.get("marks")
            .and_then(Value::as_array)
            .map(|marks| marks.iter().any(|m| m.get("type").and_then(Value::as_str) == Some(name)))
            .unwrap_or(false)
    };
    if has_mark("strong") {
        format!("**{text}**")
    } else if has_mark("code") {
        format!("`{text}`")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_rich_text_is_passed_through_verbatim() {
        let converter = AdfConverter;
        let raw = json!({"version": 1, "type": "doc", "content": [{"type": "paragraph", "content": []}]});
        let converted = converter.markdown_to_remote("ignored", Some(&raw)).unwrap();
        assert_eq!(converted.payload, raw);
        assert!(converted.risk_codes.is_empty());
    }

    #[test]
    fn plain_paragraph_round_trips_through_markdown_and_back() {
        let converter = AdfConverter;
        let converted = converter.markdown_to_remote("Fix the **login** flow using `retry()`.", None).unwrap();
        assert!(converted.risk_codes.is_empty());

        let (markdown, raw) = converter.remote_to_markdown(&converted.payload).unwrap();
        assert_eq!(markdown, "Fix the **login** flow using `retry()`.");
        assert!(raw.is_some());
    }

    #[test]
    fn bullet_list_round_trips() {
        let converter = AdfConverter;
        let converted = converter.markdown_to_remote("- first\n- second", None).unwrap();
        let (markdown, _) = converter.remote_to_markdown(&converted.payload).unwrap();
        assert_eq!(markdown, "- first\n- second");
    }

    #[test]
    fn table_syntax_is_flagged_risky() {
        let converter = AdfConverter;
        let converted = converter.markdown_to_remote("| a | b |\n| - | - |", None).unwrap();
        assert_eq!(converted.risk_codes, vec![ReasonCode::DescriptionAdfBlockMalformed]);
    }

    #[test]
    fn multiple_paragraphs_become_multiple_adf_blocks() {
        let converter = AdfConverter;
        let converted = converter.markdown_to_remote("First paragraph.\n\nSecond paragraph.", None).unwrap();
        let content = converted.payload.get("content").and_then(Value::as_array).unwrap();
        assert_eq!(content.len(), 2);
    }
}
