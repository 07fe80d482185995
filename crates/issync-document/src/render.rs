use issync_types::Document;

use crate::richtext::render_rich_text_block;

/// Render a [`Document`] into the canonical on-disk issue-file text.
///
/// Front matter is emitted in the frozen order `schema_version, key,
/// summary, issue_type, status, priority, assignee, labels, reporter,
/// created_at, updated_at, synced_at`; optional keys whose normalized value
/// is empty are omitted entirely. String values are JSON-quoted; labels use
/// the hyphen-list form.
pub fn render(doc: &Document) -> String {
    let fm = &doc.front_matter;
    let mut out = String::from("---\n");

    push_scalar(&mut out, "schema_version", &fm.schema_version);
    push_scalar(&mut out, "key", &fm.key);
    push_scalar(&mut out, "summary", &fm.summary);
    push_scalar(&mut out, "issue_type", &fm.issue_type);
    push_scalar(&mut out, "status", &fm.status);
    if let Some(priority) = &fm.priority {
        push_scalar(&mut out, "priority", priority);
    }
    if let Some(assignee) = &fm.assignee {
        push_scalar(&mut out, "assignee", assignee);
    }
    if !fm.labels.is_empty() {
        out.push_str("labels:\n");
        for label in &fm.labels {
            out.push_str("- ");
            out.push_str(&serde_json::to_string(label).expect("string always serializes"));
            out.push('\n');
        }
    }
    if let Some(reporter) = &fm.reporter {
        push_scalar(&mut out, "reporter", reporter);
    }
    if let Some(created_at) = &fm.created_at {
        push_scalar(&mut out, "created_at", created_at);
    }
    if let Some(updated_at) = &fm.updated_at {
        push_scalar(&mut out, "updated_at", updated_at);
    }
    if let Some(synced_at) = &fm.synced_at {
        push_scalar(&mut out, "synced_at", synced_at);
    }

    out.push_str("---\n");

    let body = doc.markdown_body.trim();
    if !body.is_empty() || doc.raw_rich_text_json.is_some() {
        out.push('\n');
    }
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }

    if let Some(rich_text) = &doc.raw_rich_text_json {
        if !body.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_rich_text_block(rich_text));
        out.push('\n');
    }

    out
}

fn push_scalar(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&serde_json::to_string(value).expect("string always serializes"));
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn sample() -> String {
        [
            "---",
            "schema_version: \"1\"",
            "key: \"PROJ-123\"",
            "summary: \"Fix Login: flow\"",
            "issue_type: \"Task\"",
            "status: \"In Progress\"",
            "priority: \"  HIGH \"",
            "labels:",
            "- \"Bug\"",
            "- \"p1\"",
            "- \"bug\"",
            "---",
            "",
            "User-facing markdown description.",
            "",
            "```jira-adf",
            "{\"version\":1,\"type\":\"doc\",\"content\":[]}",
            "```",
        ]
        .join("\n")
    }

    #[test]
    fn render_emits_frozen_field_order() {
        let doc = parse(&sample()).unwrap();
        let rendered = render(&doc);
        let key_idx = rendered.find("key:").unwrap();
        let summary_idx = rendered.find("summary:").unwrap();
        let priority_idx = rendered.find("priority:").unwrap();
        let labels_idx = rendered.find("labels:").unwrap();
        assert!(key_idx < summary_idx);
        assert!(summary_idx < priority_idx);
        assert!(priority_idx < labels_idx);
    }

    #[test]
    fn render_omits_empty_optional_fields() {
        let doc = parse(&sample()).unwrap();
        let rendered = render(&doc);
        assert!(!rendered.contains("assignee:"));
        assert!(!rendered.contains("reporter:"));
    }

    #[test]
    fn round_trip_is_idempotent() {
        let doc = parse(&sample()).unwrap();
        let first = render(&doc);
        let reparsed = parse(&first).unwrap();
        let second = render(&reparsed);
        assert_eq!(first, second);

        let reparsed_again = parse(&second).unwrap();
        let third = render(&reparsed_again);
        assert_eq!(second, third);
    }

    #[test]
    fn render_without_body_or_rich_text_has_no_trailing_blank_section() {
        let minimal = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n";
        let doc = parse(minimal).unwrap();
        let rendered = render(&doc);
        assert_eq!(rendered, "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n");
    }
}
