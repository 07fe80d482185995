//! Publish a local draft (`L-<hex>`) as a new remote issue, rekeying the
//! local file in place.

use issync_document::{issue_filename, parse, render};
use issync_store::{StoreError, WorkspaceStore};
use issync_types::{CanonicalKey, Document, IssueStatus, Message, PerIssueResult, ReasonCode};

use crate::ports::{
    ContentConverter, ConvertError, CreateIssueRequest, CreateIssueRequestWithDescription, RemoteAdapter, RemoteError,
};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("{key} is not a local-draft key")]
    NotADraft { key: String },
    #[error("no project key is configured for draft {key}")]
    NoProjectKey { key: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl DraftError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            DraftError::NotADraft { .. } | DraftError::NoProjectKey { .. } => ReasonCode::ValidationFailed,
            DraftError::Store(e) => e.reason_code(),
            DraftError::Remote(e) => e.reason_code(),
            DraftError::Convert(e) => e.reason_code(),
        }
    }
}

/// Publish the draft at `old_filename`, rewriting the workspace in place.
/// Returns the per-issue result alongside the rekeyed document, so the
/// caller can fold the new canonical key into cache/status bookkeeping.
pub fn publish_draft(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &WorkspaceStore,
    doc: &Document,
    old_filename: &str,
    project_key: &str,
    issue_type_name: &str,
) -> Result<(Document, PerIssueResult), DraftError> {
    let old_key = doc.canonical_key.as_str().to_string();
    if !doc.canonical_key.is_draft() {
        return Err(DraftError::NotADraft { key: old_key });
    }
    if project_key.trim().is_empty() {
        return Err(DraftError::NoProjectKey { key: old_key });
    }

    let remote_key = match reused_remote_key(store, &old_key)? {
        Some(key) => key,
        None => {
            let converted = converter.markdown_to_remote(&doc.markdown_body, doc.raw_rich_text_json.as_ref())?;
            let request = CreateIssueRequestWithDescription {
                base: CreateIssueRequest {
                    project_key: project_key.to_string(),
                    issue_type_name: issue_type_name.to_string(),
                    summary: doc.front_matter.summary.clone(),
                    labels: doc.front_matter.labels.iter().cloned().collect(),
                    assignee_account_id: doc.front_matter.assignee.clone(),
                    priority_name: doc.front_matter.priority.clone(),
                },
                description: Some(converted.payload),
            };
            adapter.create_issue(request)?.key
        }
    };

    let mut rekeyed = doc.clone();
    rekeyed.canonical_key = CanonicalKey::parse(&remote_key).expect("remote adapter returned a valid key");
    rekeyed.front_matter.key = remote_key.clone();
    rekeyed.markdown_body = rewrite_draft_references(&doc.markdown_body, &old_key, &remote_key);

    let canonical = render(&rekeyed);
    // round-trip through the parser so `rekeyed` is exactly what a later
    // read of the file would produce, matching the three-way planner's
    // equality basis.
    let rekeyed = parse(&canonical).expect("just-rendered document must reparse");

    let new_filename = issue_filename(&rekeyed.canonical_key, &rekeyed.front_matter.summary);
    let written_path = store.write_issue_file(&new_filename, &rekeyed.front_matter.status, &canonical, Some(old_filename))?;

    store.write_snapshot(&old_key, &canonical)?;
    store.write_snapshot(&remote_key, &canonical)?;

    let result = PerIssueResult {
        key: remote_key,
        action: "create".to_string(),
        status: IssueStatus::Success,
        messages: vec![Message::info(format!(
            "published {old_key} as {} at {}",
            rekeyed.canonical_key,
            written_path.display()
        ))],
    };

    Ok((rekeyed, result))
}

/// A prior successful publish leaves a base-snapshot marker at the draft
/// key whose document now carries a remote key; reuse it instead of
/// creating a second remote issue.
fn reused_remote_key(store: &WorkspaceStore, old_key: &str) -> Result<Option<String>, DraftError> {
    let Some(snapshot) = store.read_snapshot(old_key)? else {
        return Ok(None);
    };
    let Ok(marker) = parse(&snapshot) else {
        return Ok(None);
    };
    if marker.canonical_key.is_remote() {
        Ok(Some(marker.canonical_key.as_str().to_string()))
    } else {
        Ok(None)
    }
}

/// Rewrite `#<old_key>` references in plain Markdown text to `#<new_key>`.
/// Only exact-boundary matches of `old_key` are rewritten (a trailing hex
/// digit would belong to a different draft's key and must not match).
///
/// `markdown` here is always a [`Document`]'s already-extracted
/// `markdown_body` — the embedded raw-rich-text block lives in a separate
/// opaque JSON field and is never passed through this function, so the
/// "except inside fenced blocks" carve-out holds by construction.
fn rewrite_draft_references(markdown: &str, old_key: &str, new_key: &str) -> String {
    let needle = format!("#{old_key}");
    let mut out = String::with_capacity(markdown.len());
    let mut rest = markdown;
    while let Some(pos) = rest.find(&needle) {
        let (before, after_needle) = rest.split_at(pos);
        let after = &after_needle[needle.len()..];
        let boundary = after.chars().next().is_none_or(|c| !(c.is_ascii_hexdigit() && c.is_ascii_lowercase()));
        out.push_str(before);
        if boundary {
            out.push('#');
            out.push_str(new_key);
        } else {
            out.push_str(&needle);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tempfile::tempdir;

    use super::*;
    use crate::ports::{ConvertedDescription, CreatedIssue, RemoteIssue, SearchResult, TransitionCandidate};

    struct FakeAdapter {
        created_key: String,
    }

    impl RemoteAdapter for FakeAdapter {
        fn search_issues(&self, _: &str, _: u64, _: u64, _: Option<&str>) -> Result<SearchResult, RemoteError> {
            unimplemented!()
        }
        fn get_issue(&self, _: &str) -> Result<RemoteIssue, RemoteError> {
            unimplemented!()
        }
        fn create_issue(&self, _: CreateIssueRequestWithDescription) -> Result<CreatedIssue, RemoteError> {
            Ok(CreatedIssue { id: "10001".to_string(), key: self.created_key.clone(), self_url: "https://example/10001".to_string() })
        }
        fn update_issue(&self, _: &str, _: crate::ports::RemoteUpdateWithDescription) -> Result<(), RemoteError> {
            unimplemented!()
        }
        fn list_transitions(&self, _: &str) -> Result<Vec<TransitionCandidate>, RemoteError> {
            unimplemented!()
        }
        fn apply_transition(&self, _: &str, _: &str) -> Result<(), RemoteError> {
            unimplemented!()
        }
    }

    struct PassthroughConverter;

    impl ContentConverter for PassthroughConverter {
        fn markdown_to_remote(&self, markdown: &str, _: Option<&serde_json::Value>) -> Result<ConvertedDescription, ConvertError> {
            Ok(ConvertedDescription { payload: serde_json::json!({"raw": markdown}), risk_codes: Vec::new() })
        }
        fn remote_to_markdown(&self, payload: &serde_json::Value) -> Result<(String, Option<serde_json::Value>), ConvertError> {
            Ok((payload.to_string(), None))
        }
    }

    fn draft_doc(key: &str, summary: &str, body: &str) -> Document {
        let src = format!(
            "---\nschema_version: \"1\"\nkey: \"{key}\"\nsummary: \"{summary}\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n\n{body}\n"
        );
        parse(&src).unwrap()
    }

    #[test]
    fn publishes_a_fresh_draft_and_writes_both_snapshots() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let doc = draft_doc("L-1a2b3c", "New draft", "See also #L-1a2b3c for context.");
        let old_filename = "L-1a2b3c-new-draft.md";
        store.write_issue_file(old_filename, "Open", &render(&doc), None).unwrap();

        let adapter = FakeAdapter { created_key: "PROJ-42".to_string() };
        let (rekeyed, result) =
            publish_draft(&adapter, &PassthroughConverter, &store, &doc, old_filename, "PROJ", "Task").unwrap();

        assert_eq!(rekeyed.canonical_key.as_str(), "PROJ-42");
        assert!(rekeyed.markdown_body.contains("#PROJ-42"));
        assert!(!rekeyed.markdown_body.contains("#L-1a2b3c"));
        assert_eq!(result.key, "PROJ-42");
        assert_eq!(result.status, IssueStatus::Success);

        assert!(store.fs().exists("open/PROJ-42-new-draft.md").unwrap());
        assert!(!store.fs().exists(old_filename).unwrap());
        assert!(store.read_snapshot("L-1a2b3c").unwrap().is_some());
        assert!(store.read_snapshot("PROJ-42").unwrap().is_some());
    }

    #[test]
    fn rejects_a_non_draft_key() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();
        let doc = draft_doc("PROJ-1", "Not a draft", "body");
        let adapter = FakeAdapter { created_key: "PROJ-99".to_string() };
        let err = publish_draft(&adapter, &PassthroughConverter, &store, &doc, "PROJ-1-not-a-draft.md", "PROJ", "Task")
            .unwrap_err();
        assert!(matches!(err, DraftError::NotADraft { .. }));
    }

    #[test]
    fn reuses_existing_marker_instead_of_creating_twice() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let doc = draft_doc("L-1a2b3c", "New draft", "body");
        let old_filename = "L-1a2b3c-new-draft.md";
        store.write_issue_file(old_filename, "Open", &render(&doc), None).unwrap();

        let mut marker = doc.clone();
        marker.canonical_key = CanonicalKey::parse("PROJ-42").unwrap();
        marker.front_matter.key = "PROJ-42".to_string();
        store.write_snapshot("L-1a2b3c", &render(&marker)).unwrap();

        let adapter = FakeAdapter { created_key: "PROJ-SHOULD-NOT-BE-USED".to_string() };
        let (rekeyed, _) = publish_draft(&adapter, &PassthroughConverter, &store, &doc, old_filename, "PROJ", "Task").unwrap();
        assert_eq!(rekeyed.canonical_key.as_str(), "PROJ-42");
    }

    #[test]
    fn rewrite_draft_references_does_not_match_a_longer_key() {
        let out = rewrite_draft_references("see #L-1a2 and #L-1a2b", "L-1a2", "PROJ-1");
        assert_eq!(out, "see #PROJ-1 and #L-1a2b");
    }
}
