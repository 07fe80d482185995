//! Fetch, convert, and persist remote issues into the workspace.

use std::collections::VecDeque;
use std::sync::Mutex;

use issync_document::{canonicalize::canonical_labels, issue_filename, render};
use issync_store::{bucket_for_status, StoreError, WorkspaceStore};
use issync_types::{
    AggregateCounts, CanonicalKey, Clock, Document, FrontMatter, IssueStatus, Message, PerIssueResult, ReasonCode,
};

use crate::ports::{ContentConverter, RemoteAdapter, RemoteError, RemoteIssue};

#[derive(Debug, Clone)]
pub struct PullOptions {
    pub query: String,
    pub page_size: u64,
    pub concurrency: usize,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self { query: String::new(), page_size: 100, concurrency: 4 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PullError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            PullError::Remote(e) => e.reason_code(),
            PullError::Store(e) => e.reason_code(),
        }
    }
}

pub struct PullReport {
    pub results: Vec<PerIssueResult>,
    pub counts: AggregateCounts,
}

/// Run the full pull pipeline. Page-fetch failures are fatal (`Err`);
/// per-issue conversion and persistence outcomes are folded into the
/// returned report.
pub fn run_pull(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &WorkspaceStore,
    clock: &dyn Clock,
    options: &PullOptions,
) -> Result<PullReport, PullError> {
    let mut issues = paginate(adapter, &options.query, options.page_size)?;
    issues.sort_by(|a, b| a.key.cmp(&b.key));

    let mut prepared = prepare_concurrently(converter, issues, options.concurrency.max(1), clock);
    prepared.sort_by(|a, b| a.key().cmp(b.key()));

    let mut cache = store.load_cache()?;
    let mut counts = AggregateCounts::default();
    let mut results = Vec::with_capacity(prepared.len());

    for outcome in prepared.drain(..) {
        let result = match outcome {
            PreparedIssue::Ready { key, status, filename, canonical } => {
                match persist_one(store, &mut cache, key.clone(), status, filename, canonical) {
                    Ok(result) => result,
                    Err(e) => PerIssueResult {
                        key,
                        action: "pull".to_string(),
                        status: IssueStatus::Error,
                        messages: vec![Message::error(e.reason_code(), e.to_string())],
                    },
                }
            }
            PreparedIssue::Failed { key, reason_code, message } => {
                PerIssueResult { key, action: "pull".to_string(), status: IssueStatus::Error, messages: vec![Message::error(reason_code, message)] }
            }
        };
        counts.record(&result);
        results.push(result);
    }

    // Every issue already written to disk above must still have its cache
    // entry persisted even if a later issue in this same run failed.
    store.save_cache(&cache)?;

    Ok(PullReport { results: results.into_iter().filter(|r| r.status != IssueStatus::Skipped).collect(), counts })
}

fn persist_one(
    store: &WorkspaceStore,
    cache: &mut issync_types::Cache,
    key: String,
    status: String,
    filename: String,
    canonical: String,
) -> Result<PerIssueResult, PullError> {
    let existing_snapshot = store.read_snapshot(&key)?;
    if existing_snapshot.as_deref() == Some(canonical.as_str()) {
        return Ok(PerIssueResult {
            key,
            action: "pull".to_string(),
            status: IssueStatus::Skipped,
            messages: vec![Message::info("unchanged")],
        });
    }

    let stale_path = cache.issues.get(&key).map(|entry| entry.path.clone());
    let written = store.write_issue_file(&filename, &status, &canonical, stale_path.as_deref())?;
    store.write_snapshot(&key, &canonical)?;

    cache.issues.insert(key.clone(), WorkspaceStore::cache_entry(&written, &status, None));

    Ok(PerIssueResult { key, action: "pull".to_string(), status: IssueStatus::Success, messages: Vec::new() })
}

enum PreparedIssue {
    Ready { key: String, status: String, filename: String, canonical: String },
    Failed { key: String, reason_code: ReasonCode, message: String },
}

impl PreparedIssue {
    fn key(&self) -> &str {
        match self {
            PreparedIssue::Ready { key, .. } => key,
            PreparedIssue::Failed { key, .. } => key,
        }
    }
}

fn prepare_concurrently(
    converter: &dyn ContentConverter,
    issues: Vec<RemoteIssue>,
    concurrency: usize,
    clock: &dyn Clock,
) -> Vec<PreparedIssue> {
    let queue = Mutex::new(VecDeque::from(issues));
    let results = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for _ in 0..concurrency {
            scope.spawn(|| loop {
                let issue = {
                    let mut q = queue.lock().expect("queue mutex poisoned");
                    q.pop_front()
                };
                let Some(issue) = issue else { break };
                let prepared = prepare_one(converter, issue, clock);
                results.lock().expect("results mutex poisoned").push(prepared);
            });
        }
    });

    results.into_inner().expect("results mutex poisoned")
}

fn prepare_one(converter: &dyn ContentConverter, issue: RemoteIssue, clock: &dyn Clock) -> PreparedIssue {
    let key = issue.key.clone();
    match build_document(converter, &issue, clock) {
        Ok(doc) => {
            let filename = issue_filename(&doc.canonical_key, &doc.front_matter.summary);
            let status = doc.front_matter.status.clone();
            PreparedIssue::Ready { key, status, filename, canonical: render(&doc) }
        }
        Err((reason_code, message)) => PreparedIssue::Failed { key, reason_code, message },
    }
}

fn build_document(converter: &dyn ContentConverter, issue: &RemoteIssue, clock: &dyn Clock) -> Result<Document, (ReasonCode, String)> {
    let canonical_key = CanonicalKey::parse(&issue.key).map_err(|e| (ReasonCode::ValidationFailed, e.to_string()))?;

    let (markdown_body, raw_rich_text_json) = match &issue.description {
        Some(payload) => converter
            .remote_to_markdown(payload)
            .map_err(|e| (e.reason_code(), e.to_string()))?,
        None => (String::new(), None),
    };

    let front_matter = FrontMatter {
        schema_version: issync_types::SCHEMA_VERSION.to_string(),
        key: issue.key.clone(),
        summary: issue.summary.clone(),
        issue_type: issue.issue_type.name.clone(),
        status: issue.status.name.clone(),
        priority: issue.priority.as_ref().map(|p| p.name.clone()),
        assignee: issue.assignee.as_ref().map(|a| a.display_name.clone().unwrap_or_else(|| a.id.clone())),
        labels: canonical_labels(issue.labels.iter()),
        reporter: issue.reporter.as_ref().map(|r| r.display_name.clone().unwrap_or_else(|| r.id.clone())),
        created_at: issue.created.clone(),
        updated_at: issue.updated.clone(),
        synced_at: Some(clock.now().to_rfc3339()),
    };

    Ok(Document { canonical_key, front_matter, markdown_body, raw_rich_text_json })
}

fn paginate(adapter: &dyn RemoteAdapter, query: &str, page_size: u64) -> Result<Vec<RemoteIssue>, RemoteError> {
    let mut issues = Vec::new();
    let mut start_at = 0u64;
    let mut token: Option<String> = None;
    let mut use_tokens = false;

    loop {
        let result = adapter.search_issues(query, start_at, page_size, token.as_deref())?;
        let fetched = result.issues.len() as u64;
        let page = result.page;
        issues.extend(result.issues);

        if !use_tokens && (page.next_page_token.is_some() || page.is_last.is_some()) {
            use_tokens = true;
        }

        if use_tokens {
            let done = page.is_last == Some(true) || page.next_page_token.as_deref().unwrap_or("").is_empty();
            if done {
                break;
            }
            token = page.next_page_token;
        } else {
            start_at += fetched;
            if fetched < page_size || start_at >= page.total {
                break;
            }
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use issync_types::{FixedClock, SearchPage, TransitionCandidate};
    use tempfile::tempdir;

    use super::*;
    use crate::ports::{
        ConvertError, ConvertedDescription, CreateIssueRequestWithDescription, CreatedIssue, NamedRef, SearchResult,
    };

    struct PagedAdapter {
        pages: Mutex<VecDeque<SearchResult>>,
        calls: AtomicU64,
    }

    impl RemoteAdapter for PagedAdapter {
        fn search_issues(&self, _: &str, _: u64, _: u64, _: Option<&str>) -> Result<SearchResult, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.lock().unwrap().pop_front().expect("no more pages configured"))
        }
        fn get_issue(&self, _: &str) -> Result<RemoteIssue, RemoteError> {
            unimplemented!()
        }
        fn create_issue(&self, _: CreateIssueRequestWithDescription) -> Result<CreatedIssue, RemoteError> {
            unimplemented!()
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

    struct PlainConverter;

    impl ContentConverter for PlainConverter {
        fn markdown_to_remote(&self, markdown: &str, _: Option<&serde_json::Value>) -> Result<ConvertedDescription, ConvertError> {
            Ok(ConvertedDescription { payload: serde_json::json!({"raw": markdown}), risk_codes: Vec::new() })
        }
        fn remote_to_markdown(&self, payload: &serde_json::Value) -> Result<(String, Option<serde_json::Value>), ConvertError> {
            Ok((payload.get("raw").and_then(|v| v.as_str()).unwrap_or_default().to_string(), None))
        }
    }

    fn issue(key: &str, summary: &str, status: &str) -> RemoteIssue {
        RemoteIssue {
            key: key.to_string(),
            summary: summary.to_string(),
            description: Some(serde_json::json!({"raw": "body text"})),
            labels: vec!["Bug".to_string()],
            assignee: None,
            reporter: None,
            priority: None,
            issue_type: NamedRef { name: "Task".to_string() },
            status: NamedRef { name: status.to_string() },
            created: None,
            updated: None,
        }
    }

    #[test]
    fn offset_pagination_stops_on_short_page() {
        let adapter = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![SearchResult {
                page: SearchPage { start_at: 0, max_results: 100, total: 1, next_page_token: None, is_last: None },
                issues: vec![issue("PROJ-1", "One", "Open")],
            }])),
            calls: AtomicU64::new(0),
        };
        let issues = paginate(&adapter, "", 100).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn token_pagination_terminates_on_is_last() {
        let adapter = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![
                SearchResult {
                    page: SearchPage { start_at: 0, max_results: 1, total: 0, next_page_token: Some("tok".to_string()), is_last: Some(false) },
                    issues: vec![issue("PROJ-1", "One", "Open")],
                },
                SearchResult {
                    page: SearchPage { start_at: 0, max_results: 1, total: 0, next_page_token: None, is_last: Some(true) },
                    issues: vec![issue("PROJ-2", "Two", "Open")],
                },
            ])),
            calls: AtomicU64::new(0),
        };
        let issues = paginate(&adapter, "", 1).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn run_pull_writes_files_and_marks_unchanged_on_second_run() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let adapter = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![SearchResult {
                page: SearchPage { start_at: 0, max_results: 100, total: 1, next_page_token: None, is_last: None },
                issues: vec![issue("PROJ-1", "Fix login", "Open")],
            }])),
            calls: AtomicU64::new(0),
        };
        let clock = FixedClock(chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().into());
        let options = PullOptions { query: String::new(), page_size: 100, concurrency: 2 };

        let first = run_pull(&adapter, &PlainConverter, &store, &clock, &options).unwrap();
        assert_eq!(first.results.len(), 1);
        assert_eq!(first.results[0].status, IssueStatus::Success);
        assert!(store.fs().exists("open/PROJ-1-fix-login.md").unwrap());

        let adapter2 = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![SearchResult {
                page: SearchPage { start_at: 0, max_results: 100, total: 1, next_page_token: None, is_last: None },
                issues: vec![issue("PROJ-1", "Fix login", "Open")],
            }])),
            calls: AtomicU64::new(0),
        };
        let second = run_pull(&adapter2, &PlainConverter, &store, &clock, &options).unwrap();
        assert!(second.results.is_empty(), "unchanged issue should be suppressed from the default report");
    }

    #[test]
    fn run_pull_isolates_a_single_issues_persist_failure_and_still_saves_the_cache() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        // PROJ-1 collides with a pre-existing directory at its target path,
        // so its atomic write's rename fails; PROJ-2 is unaffected.
        std::fs::create_dir(td.path().join("open").join("PROJ-1-collide.md")).unwrap();

        let adapter = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![SearchResult {
                page: SearchPage { start_at: 0, max_results: 100, total: 2, next_page_token: None, is_last: None },
                issues: vec![issue("PROJ-1", "Collide", "Open"), issue("PROJ-2", "Fine", "Open")],
            }])),
            calls: AtomicU64::new(0),
        };
        let clock = FixedClock(chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().into());
        let options = PullOptions { query: String::new(), page_size: 100, concurrency: 1 };

        let report = run_pull(&adapter, &PlainConverter, &store, &clock, &options).unwrap();
        assert_eq!(report.results.len(), 2);

        let by_key = |key: &str| report.results.iter().find(|r| r.key == key).unwrap();
        assert_eq!(by_key("PROJ-1").status, IssueStatus::Error);
        assert_eq!(by_key("PROJ-2").status, IssueStatus::Success);

        // The cache write at the end of the run must still have gone through,
        // carrying PROJ-2's entry, even though PROJ-1 failed to persist.
        let cache = store.load_cache().unwrap();
        assert!(cache.issues.contains_key("PROJ-2"));
        assert!(!cache.issues.contains_key("PROJ-1"));
        assert!(store.fs().exists("open/PROJ-2-fine.md").unwrap());
    }

    #[test]
    fn run_pull_routes_closed_status_into_closed_dir() {
        let td = tempdir().unwrap();
        let store = WorkspaceStore::new(td.path());
        store.ensure_layout().unwrap();

        let adapter = PagedAdapter {
            pages: Mutex::new(VecDeque::from(vec![SearchResult {
                page: SearchPage { start_at: 0, max_results: 100, total: 1, next_page_token: None, is_last: None },
                issues: vec![issue("PROJ-1", "Done thing", "Done")],
            }])),
            calls: AtomicU64::new(0),
        };
        let clock = FixedClock(chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().into());
        let options = PullOptions { query: String::new(), page_size: 100, concurrency: 1 };

        run_pull(&adapter, &PlainConverter, &store, &clock, &options).unwrap();
        assert_eq!(bucket_for_status("Done"), "closed");
        assert!(store.fs().exists("closed/PROJ-1-done-thing.md").unwrap());
    }
}
