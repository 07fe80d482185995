use std::collections::BTreeSet;

use crate::CanonicalKey;

/// The ordered front-matter record of an issue file.
///
/// Field order here mirrors the frozen render order:
/// `schema_version, key, summary, issue_type, status, priority, assignee,
/// labels, reporter, created_at, updated_at, synced_at`. Timestamp fields are
/// opaque strings — this crate never parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub schema_version: String,
    pub key: String,
    pub summary: String,
    pub issue_type: String,
    pub status: String,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub labels: BTreeSet<String>,
    pub reporter: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub synced_at: Option<String>,
}

/// The frozen schema version literal. `issync-document` rejects anything else.
pub const SCHEMA_VERSION: &str = "1";

/// An immutable in-memory representation of one issue file.
///
/// Construction and canonicalization live in `issync-document`; this type is
/// just the shape both the parser and the planner agree on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub canonical_key: CanonicalKey,
    pub front_matter: FrontMatter,
    /// Normalized body text with any `jira-adf` block extracted out.
    pub markdown_body: String,
    /// At most one canonicalized `{version:1, type:"doc", content:[...]}` object.
    pub raw_rich_text_json: Option<serde_json::Value>,
}
