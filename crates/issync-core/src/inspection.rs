//! Read-only analyses over the workspace: `list`, `status`, `diff`.

use std::path::PathBuf;

use issync_document::{parse, render};
use issync_store::{StoreError, WorkspaceStore};
use issync_types::{CanonicalKey, IssueStatus, Message, PerIssueResult, ReasonCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    All,
    Open,
    Closed,
}

impl StateFilter {
    fn matches(self, path: &std::path::Path) -> bool {
        let bucket = path.components().next().and_then(|c| c.as_os_str().to_str());
        match self {
            StateFilter::All => true,
            StateFilter::Open => bucket == Some(issync_store::OPEN_DIR),
            StateFilter::Closed => bucket == Some(issync_store::CLOSED_DIR),
        }
    }
}

/// One workspace record as loaded by the shared loader: either a canonical
/// rendering or a typed parse failure.
pub struct LoadedRecord {
    pub key: String,
    pub path: PathBuf,
    pub canonical: Result<String, (ReasonCode, String)>,
}

/// Load and canonically render every `.md` file under `open/`/`closed/`,
/// filtered by `state` and a case-insensitive `key` substring. Sorted by
/// key then path.
pub fn load_workspace(store: &WorkspaceStore, state: StateFilter, key_contains: &str) -> Result<Vec<LoadedRecord>, StoreError> {
    let mut paths = store.list_issue_files()?;
    paths.retain(|p| state.matches(p));

    let needle = key_contains.to_lowercase();
    let mut records = Vec::new();
    for path in paths {
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let key = issync_document::parse_filename_key(&filename).map(|k| k.as_str().to_string()).unwrap_or(filename);
        if !needle.is_empty() && !key.to_lowercase().contains(&needle) {
            continue;
        }

        let canonical = match store.read_issue_file(&path) {
            Ok(contents) => match parse(&contents) {
                Ok(doc) => Ok(render(&doc)),
                Err(e) => Err((e.reason_code(), e.to_string())),
            },
            Err(e) => Err((e.reason_code(), e.to_string())),
        };

        records.push(LoadedRecord { key, path, canonical });
    }

    records.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.path.cmp(&b.path)));
    Ok(records)
}

pub fn list(store: &WorkspaceStore, state: StateFilter, key_contains: &str) -> Result<Vec<PerIssueResult>, StoreError> {
    let records = load_workspace(store, state, key_contains)?;
    Ok(records
        .into_iter()
        .map(|record| match record.canonical {
            Ok(_) => PerIssueResult { key: record.key, action: "list".to_string(), status: IssueStatus::Success, messages: Vec::new() },
            Err((code, message)) => PerIssueResult {
                key: record.key,
                action: "list".to_string(),
                status: IssueStatus::Error,
                messages: vec![Message::error(code, message)],
            },
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Unchanged,
    LocalConflict,
    New,
    Modified,
}

impl StatusOutcome {
    fn as_str(self) -> &'static str {
        match self {
            StatusOutcome::Unchanged => "unchanged",
            StatusOutcome::LocalConflict => "local-conflict",
            StatusOutcome::New => "new",
            StatusOutcome::Modified => "modified",
        }
    }
}

/// Compare each record's canonical rendering against its base snapshot.
/// `include_unchanged` controls whether `unchanged` records are returned
/// (the default CLI view omits them).
pub fn status(
    store: &WorkspaceStore,
    state: StateFilter,
    key_contains: &str,
    include_unchanged: bool,
) -> Result<Vec<PerIssueResult>, StoreError> {
    let records = load_workspace(store, state, key_contains)?;
    let mut results = Vec::new();

    for record in records {
        let canonical = match record.canonical {
            Ok(c) => c,
            Err((code, message)) => {
                results.push(PerIssueResult {
                    key: record.key,
                    action: "status".to_string(),
                    status: IssueStatus::Conflict,
                    messages: vec![Message::error(code, message)],
                });
                continue;
            }
        };

        let snapshot = store.read_snapshot(&record.key)?;
        let outcome = classify(&record.key, &canonical, snapshot.as_deref());
        if outcome == StatusOutcome::Unchanged && !include_unchanged {
            continue;
        }

        let (status, reason_code) = match outcome {
            StatusOutcome::Unchanged => (IssueStatus::Success, None),
            StatusOutcome::LocalConflict => (IssueStatus::Conflict, Some(ReasonCode::ConflictBaseSnapshotMissing)),
            StatusOutcome::New | StatusOutcome::Modified => (IssueStatus::Success, None),
        };
        let messages = match reason_code {
            Some(code) => vec![Message::warning(code, outcome.as_str())],
            None => vec![Message::info(outcome.as_str())],
        };
        results.push(PerIssueResult { key: record.key, action: "status".to_string(), status, messages });
    }

    Ok(results)
}

fn classify(key: &str, canonical: &str, snapshot: Option<&str>) -> StatusOutcome {
    match snapshot {
        Some(s) if s == canonical => StatusOutcome::Unchanged,
        Some(_) => StatusOutcome::Modified,
        None => {
            let is_remote = CanonicalKey::parse(key).map(|k| k.is_remote()).unwrap_or(false);
            if is_remote { StatusOutcome::LocalConflict } else { StatusOutcome::New }
        }
    }
}

/// One per-issue diff: present only for records classified `modified`.
pub struct DiffRecord {
    pub key: String,
    pub text: String,
}

pub fn diff(store: &WorkspaceStore, state: StateFilter, key_contains: &str) -> Result<Vec<DiffRecord>, StoreError> {
    let records = load_workspace(store, state, key_contains)?;
    let mut out = Vec::new();

    for record in records {
        let Ok(canonical) = record.canonical else { continue };
        let snapshot = store.read_snapshot(&record.key)?;
        if classify(&record.key, &canonical, snapshot.as_deref()) != StatusOutcome::Modified {
            continue;
        }
        let original = snapshot.expect("modified implies a snapshot exists");
        out.push(DiffRecord { key: record.key, text: line_diff(&original, &canonical) });
    }

    Ok(out)
}

/// Deterministic line-oriented diff with a one-line lookahead heuristic:
/// when the next line on one side matches the current line on the other,
/// treat it as a pure insertion/deletion instead of a same-position
/// replacement. Never attempts LCS optimization — output is simple and
/// stable, not minimal, across every run over the same inputs.
pub fn line_diff(original: &str, local: &str) -> String {
    let a: Vec<&str> = original.lines().collect();
    let b: Vec<&str> = local.lines().collect();
    let mut out = String::from("--- original\n+++ local\n");
    let mut i = 0;
    let mut j = 0;

    while i < a.len() || j < b.len() {
        if i < a.len() && j < b.len() && a[i] == b[j] {
            i += 1;
            j += 1;
            continue;
        }
        if i < a.len() && j + 1 < b.len() && a[i] == b[j + 1] {
            out.push('+');
            out.push_str(b[j]);
            out.push('\n');
            j += 1;
            continue;
        }
        if i + 1 < a.len() && j < b.len() && a[i + 1] == b[j] {
            out.push('-');
            out.push_str(a[i]);
            out.push('\n');
            i += 1;
            continue;
        }
        if i < a.len() && j < b.len() {
            out.push('-');
            out.push_str(a[i]);
            out.push('\n');
            out.push('+');
            out.push_str(b[j]);
            out.push('\n');
            i += 1;
            j += 1;
            continue;
        }
        if i < a.len() {
            out.push('-');
            out.push_str(a[i]);
            out.push('\n');
            i += 1;
            continue;
        }
        out.push('+');
        out.push_str(b[j]);
        out.push('\n');
        j += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn doc_src(key: &str, summary: &str, body: &str) -> String {
        format!("---\nschema_version: \"1\"\nkey: \"{key}\"\nsummary: \"{summary}\"\nissue_type: \"Task\"\nstatus: \"Open\"\n---\n\n{body}\n")
    }

    #[test]
    fn unchanged_is_omitted_by_default() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let src = doc_src("PROJ-1", "Fix", "body");
        let canonical = render(&parse(&src).unwrap());
        store.write_issue_file("PROJ-1-fix.md", "Open", &canonical, None).unwrap();
        store.write_snapshot("PROJ-1", &canonical).unwrap();

        let results = status(&store, StateFilter::All, "", false).unwrap();
        assert!(results.is_empty());

        let results = status(&store, StateFilter::All, "", true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].messages[0].text, "unchanged");
    }

    #[test]
    fn missing_snapshot_on_remote_key_is_local_conflict() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let canonical = render(&parse(&doc_src("PROJ-1", "Fix", "body")).unwrap());
        store.write_issue_file("PROJ-1-fix.md", "Open", &canonical, None).unwrap();

        let results = status(&store, StateFilter::All, "", false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, IssueStatus::Conflict);
        assert_eq!(results[0].messages[0].reason_code, Some(ReasonCode::ConflictBaseSnapshotMissing));
    }

    #[test]
    fn missing_snapshot_on_draft_key_is_new() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let canonical = render(&parse(&doc_src("L-1a2b3c", "Draft", "body")).unwrap());
        store.write_issue_file("L-1a2b3c-draft.md", "Open", &canonical, None).unwrap();

        let results = status(&store, StateFilter::All, "", false).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, IssueStatus::Success);
        assert_eq!(results[0].messages[0].text, "new");
    }

    #[test]
    fn modified_record_produces_a_diff() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let old = render(&parse(&doc_src("PROJ-1", "Old summary", "Line one.\nLine two.")).unwrap());
        store.write_snapshot("PROJ-1", &old).unwrap();
        let new = render(&parse(&doc_src("PROJ-1", "New summary", "Line one.\nLine two.")).unwrap());
        store.write_issue_file("PROJ-1-old-summary.md", "Open", &new, None).unwrap();

        let diffs = diff(&store, StateFilter::All, "").unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].text.starts_with("--- original\n+++ local\n"));
        assert!(diffs[0].text.contains("-summary: \"Old summary\""));
        assert!(diffs[0].text.contains("+summary: \"New summary\""));
    }

    #[test]
    fn list_returns_every_record_regardless_of_snapshot_state() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();
        let canonical = render(&parse(&doc_src("PROJ-1", "Fix", "body")).unwrap());
        store.write_issue_file("PROJ-1-fix.md", "Open", &canonical, None).unwrap();

        let results = list(&store, StateFilter::All, "").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].action, "list");
    }

    #[test]
    fn line_diff_is_deterministic_across_repeated_runs() {
        let original = "a\nb\nc\n";
        let local = "a\nx\nc\n";
        let first = line_diff(original, local);
        let second = line_diff(original, local);
        assert_eq!(first, second);
        assert_eq!(first, "--- original\n+++ local\na\n-b\n+x\nc\n");
    }

    #[test]
    fn line_diff_handles_pure_insertion_via_lookahead() {
        let original = "a\nc\n";
        let local = "a\nb\nc\n";
        let diff_text = line_diff(original, local);
        assert_eq!(diff_text, "--- original\n+++ local\na\n+b\nc\n");
    }
}
