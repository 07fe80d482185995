use std::collections::BTreeSet;

use issync_types::{CanonicalKey, Document, FrontMatter};

use crate::canonicalize::canonical_labels;
use crate::error::ParseError;
use crate::richtext::extract_rich_text;

const REQUIRED_SCALAR_FIELDS: &[&str] = &["schema_version", "key", "summary", "issue_type", "status"];
const OPTIONAL_SCALAR_FIELDS: &[&str] =
    &["priority", "assignee", "reporter", "created_at", "updated_at", "synced_at"];

enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// Parse a normalized issue file into a canonical [`Document`].
///
/// `raw` need not have normalized line endings; this folds `\r\n`/`\r` to
/// `\n` before doing anything else.
pub fn parse(raw: &str) -> Result<Document, ParseError> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    if lines.first() != Some(&"---") {
        return Err(ParseError::MalformedDocument);
    }

    let closing = lines[1..]
        .iter()
        .position(|l| *l == "---")
        .map(|offset| offset + 1)
        .ok_or(ParseError::MalformedDocument)?;

    let fields = parse_front_matter_lines(&lines[1..closing])?;

    let body_lines = &lines[closing + 1..];
    let mut body = body_lines.join("\n");
    if body.starts_with('\n') {
        body.remove(0);
    }
    let body = body.trim().to_string();

    let (markdown_body, raw_rich_text_json) = extract_rich_text(&body)?;

    let front_matter = build_front_matter(fields)?;
    let canonical_key =
        CanonicalKey::parse(&front_matter.key).map_err(|_| ParseError::InvalidIssueKey(front_matter.key.clone()))?;

    Ok(Document { canonical_key, front_matter, markdown_body, raw_rich_text_json })
}

fn parse_front_matter_lines(lines: &[&str]) -> Result<Vec<(String, FieldValue)>, ParseError> {
    let mut fields = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            return Err(ParseError::MalformedFrontMatter(line.to_string()));
        }

        let (key, rest) = line.split_once(':').ok_or_else(|| ParseError::MalformedFrontMatter(line.to_string()))?;
        let key = key.trim().to_string();
        let rest = rest.trim();

        if !REQUIRED_SCALAR_FIELDS.contains(&key.as_str())
            && !OPTIONAL_SCALAR_FIELDS.contains(&key.as_str())
            && key != "labels"
        {
            return Err(ParseError::UnsupportedField(key));
        }

        if key == "labels" {
            if rest.is_empty() {
                let mut items = Vec::new();
                i += 1;
                while i < lines.len() {
                    let candidate = lines[i].trim_start();
                    let Some(quoted) = candidate.strip_prefix("- ") else { break };
                    let value: String = serde_json::from_str(quoted.trim())
                        .map_err(|_| ParseError::MalformedFrontMatter(lines[i].to_string()))?;
                    items.push(value);
                    i += 1;
                }
                fields.push((key, FieldValue::List(items)));
                continue;
            } else if rest.starts_with('[') {
                let items: Vec<String> =
                    serde_json::from_str(rest).map_err(|_| ParseError::MalformedFrontMatter(line.to_string()))?;
                fields.push((key, FieldValue::List(items)));
                i += 1;
                continue;
            } else {
                return Err(ParseError::MalformedFrontMatter(line.to_string()));
            }
        }

        let value: String =
            serde_json::from_str(rest).map_err(|_| ParseError::MalformedFrontMatter(line.to_string()))?;
        fields.push((key, FieldValue::Scalar(value)));
        i += 1;
    }
    Ok(fields)
}

fn build_front_matter(fields: Vec<(String, FieldValue)>) -> Result<FrontMatter, ParseError> {
    let mut scalars: Vec<(String, String)> = Vec::new();
    let mut labels: BTreeSet<String> = BTreeSet::new();

    for (key, value) in fields {
        match value {
            FieldValue::Scalar(s) => scalars.push((key, s)),
            FieldValue::List(items) => {
                if key != "labels" {
                    return Err(ParseError::UnsupportedField(key));
                }
                labels = canonical_labels(items);
            }
        }
    }

    let get = |name: &str| -> Option<String> { scalars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()) };

    let mut required = Vec::new();
    for name in REQUIRED_SCALAR_FIELDS {
        match get(name) {
            Some(value) if !value.trim().is_empty() => required.push(value),
            Some(_) => return Err(ParseError::InvalidRequiredValue { field: name }),
            None => return Err(ParseError::MissingRequiredField(name)),
        }
    }
    let [schema_version, key, summary, issue_type, status]: [String; 5] =
        required.try_into().expect("exactly five required fields");

    if schema_version != issync_types::SCHEMA_VERSION {
        return Err(ParseError::InvalidSchemaVersion(schema_version));
    }

    let priority = get("priority").map(|p| crate::canonicalize::title_case(&p)).filter(|p| !p.is_empty());
    let assignee = get("assignee").filter(|v| !v.trim().is_empty());
    let reporter = get("reporter").filter(|v| !v.trim().is_empty());
    let created_at = get("created_at").filter(|v| !v.trim().is_empty());
    let updated_at = get("updated_at").filter(|v| !v.trim().is_empty());
    let synced_at = get("synced_at").filter(|v| !v.trim().is_empty());

    Ok(FrontMatter {
        schema_version,
        key,
        summary,
        issue_type,
        status,
        priority,
        assignee,
        labels,
        reporter,
        created_at,
        updated_at,
        synced_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn parses_the_full_sample() {
        let doc = parse(&sample()).unwrap();
        assert_eq!(doc.canonical_key.as_str(), "PROJ-123");
        assert_eq!(doc.front_matter.summary, "Fix Login: flow");
        assert_eq!(doc.front_matter.priority.as_deref(), Some("High"));
        assert_eq!(doc.front_matter.labels.iter().collect::<Vec<_>>(), vec!["bug", "p1"]);
        assert_eq!(doc.markdown_body, "User-facing markdown description.");
        assert!(doc.raw_rich_text_json.is_some());
    }

    #[test]
    fn rejects_missing_opening_delimiter() {
        let err = parse("schema_version: \"1\"\n---\n").unwrap_err();
        assert_eq!(err, ParseError::MalformedDocument);
    }

    #[test]
    fn rejects_missing_closing_delimiter() {
        let err = parse("---\nschema_version: \"1\"\n").unwrap_err();
        assert_eq!(err, ParseError::MalformedDocument);
    }

    #[test]
    fn rejects_unsupported_field() {
        let doc = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\nbogus: \"x\"\n---\n";
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedField(ref f) if f == "bogus"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let doc = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\n---\n";
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::MissingRequiredField("status")));
    }

    #[test]
    fn rejects_empty_required_value() {
        let doc = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"   \"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n";
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRequiredValue { field: "summary" }));
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let doc = "---\nschema_version: \"2\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n";
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSchemaVersion(ref v) if v == "2"));
    }

    #[test]
    fn rejects_invalid_issue_key() {
        let doc = "---\nschema_version: \"1\"\nkey: \"nope\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n";
        let err = parse(doc).unwrap_err();
        assert!(matches!(err, ParseError::InvalidIssueKey(ref v) if v == "nope"));
    }

    #[test]
    fn parses_inline_bracketed_labels() {
        let doc = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\nlabels: [\"a\", \"b\", \"a\"]\n---\n";
        let doc = parse(doc).unwrap();
        assert_eq!(doc.front_matter.labels.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn normalizes_crlf_line_endings() {
        let crlf = sample().replace('\n', "\r\n");
        let doc = parse(&crlf).unwrap();
        assert_eq!(doc.canonical_key.as_str(), "PROJ-123");
    }

    #[test]
    fn document_without_optional_fields_parses() {
        let doc = "---\nschema_version: \"1\"\nkey: \"PROJ-1\"\nsummary: \"s\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n\nBody.\n";
        let doc = parse(doc).unwrap();
        assert!(doc.front_matter.priority.is_none());
        assert!(doc.front_matter.labels.is_empty());
        assert_eq!(doc.markdown_body, "Body.");
    }
}
