//! Drive the three-way planner and executor (and the draft publisher) over
//! every local issue file — the top-level "push" stage the sync orchestrator
//! and the CLI's `push` command both call into.

use issync_document::canonicalize::{canonical_labels, title_case};
use issync_document::{parse, render};
use issync_store::{StoreError, WorkspaceStore};
use issync_types::{AggregateCounts, IssueStatus, Message, PerIssueResult, ReasonCode};

use crate::draft::{publish_draft, DraftError};
use crate::executor::execute_plan;
use crate::planner::{build_plan, FieldSet, PlanInputs};
use crate::ports::{ContentConverter, RemoteAdapter};

#[derive(Debug, Clone)]
pub struct PushOptions {
    pub dry_run: bool,
    pub project_key: Option<String>,
    pub issue_type_name: String,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self { dry_run: false, project_key: None, issue_type_name: "Task".to_string() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PushError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            PushError::Store(e) => e.reason_code(),
        }
    }
}

pub struct PushReport {
    pub results: Vec<PerIssueResult>,
    pub counts: AggregateCounts,
}

pub fn run_push(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &WorkspaceStore,
    options: &PushOptions,
) -> Result<PushReport, PushError> {
    let mut paths = store.list_issue_files()?;
    paths.sort();

    let mut results = Vec::with_capacity(paths.len());
    let mut counts = AggregateCounts::default();

    for path in paths {
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let contents = match store.read_issue_file(&path) {
            Ok(c) => c,
            Err(e) => {
                let result = PerIssueResult {
                    key: filename.clone(),
                    action: "push".to_string(),
                    status: IssueStatus::Error,
                    messages: vec![Message::error(e.reason_code(), e.to_string())],
                };
                counts.record(&result);
                results.push(result);
                continue;
            }
        };
        let local = match parse(&contents) {
            Ok(doc) => doc,
            Err(e) => {
                let result = PerIssueResult {
                    key: filename.clone(),
                    action: "push".to_string(),
                    status: IssueStatus::Error,
                    messages: vec![Message::error(e.reason_code(), e.to_string())],
                };
                counts.record(&result);
                results.push(result);
                continue;
            }
        };

        let result = if local.canonical_key.is_draft() {
            push_draft(adapter, converter, store, &local, &filename, options)
        } else {
            push_existing(adapter, converter, store, &local, options)
        };
        counts.record(&result);
        results.push(result);
    }

    Ok(PushReport { results, counts })
}

fn push_draft(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &WorkspaceStore,
    local: &issync_types::Document,
    filename: &str,
    options: &PushOptions,
) -> PerIssueResult {
    let Some(project_key) = &options.project_key else {
        return PerIssueResult {
            key: local.canonical_key.as_str().to_string(),
            action: "publish".to_string(),
            status: IssueStatus::Warning,
            messages: vec![Message::warning(ReasonCode::ValidationFailed, "no project key configured to publish draft")],
        };
    };

    if options.dry_run {
        return PerIssueResult {
            key: local.canonical_key.as_str().to_string(),
            action: "publish".to_string(),
            status: IssueStatus::Skipped,
            messages: vec![Message::warning(ReasonCode::DryRunNoWrite, "dry run: draft not published")],
        };
    }

    match publish_draft(adapter, converter, store, local, filename, project_key, &options.issue_type_name) {
        Ok((_, result)) => result,
        Err(e) => PerIssueResult {
            key: local.canonical_key.as_str().to_string(),
            action: "publish".to_string(),
            status: draft_error_status(&e),
            messages: vec![Message::error(e.reason_code(), e.to_string())],
        },
    }
}

fn draft_error_status(e: &DraftError) -> IssueStatus {
    match e {
        DraftError::NotADraft { .. } | DraftError::NoProjectKey { .. } => IssueStatus::Warning,
        _ => IssueStatus::Error,
    }
}

fn push_existing(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &WorkspaceStore,
    local: &issync_types::Document,
    options: &PushOptions,
) -> PerIssueResult {
    let key = local.canonical_key.as_str().to_string();

    let remote_issue = match adapter.get_issue(&key) {
        Ok(issue) => issue,
        Err(e) => {
            return PerIssueResult {
                key,
                action: "push".to_string(),
                status: IssueStatus::Error,
                messages: vec![Message::error(e.reason_code(), e.to_string())],
            };
        }
    };

    let (remote_markdown, remote_rich_text) = match &remote_issue.description {
        Some(payload) => match converter.remote_to_markdown(payload) {
            Ok(parts) => parts,
            Err(e) => {
                return PerIssueResult {
                    key,
                    action: "push".to_string(),
                    status: IssueStatus::Error,
                    messages: vec![Message::error(e.reason_code(), e.to_string())],
                };
            }
        },
        None => (String::new(), None),
    };

    let remote_field_set = FieldSet {
        key: remote_issue.key.clone(),
        summary: remote_issue.summary.clone(),
        description_markdown: remote_markdown,
        description_rich_text: remote_rich_text,
        labels: canonical_labels(remote_issue.labels.iter()).into_iter().collect(),
        assignee: remote_issue.assignee.as_ref().map(|a| a.display_name.clone().unwrap_or_else(|| a.id.clone())),
        priority: remote_issue.priority.as_ref().map(|p| title_case(&p.name)).filter(|p| !p.is_empty()),
        status: remote_issue.status.name.clone(),
    };

    let base_snapshot = match store.read_snapshot(&key) {
        Ok(s) => s,
        Err(e) => {
            return PerIssueResult {
                key,
                action: "push".to_string(),
                status: IssueStatus::Error,
                messages: vec![Message::error(e.reason_code(), e.to_string())],
            };
        }
    };
    let base_doc = base_snapshot.and_then(|s| parse(&s).ok());
    let base_field_set = base_doc.as_ref().map(FieldSet::from_document);

    let local_field_set = FieldSet::from_document(local);

    let converted = converter.markdown_to_remote(&local.markdown_body, local.raw_rich_text_json.as_ref());
    let (description_payload, risk_codes) = match converted {
        Ok(c) => (Some(c.payload), c.risk_codes),
        Err(e) => {
            return PerIssueResult {
                key,
                action: "push".to_string(),
                status: IssueStatus::Error,
                messages: vec![Message::error(e.reason_code(), e.to_string())],
            };
        }
    };

    let plan = build_plan(&PlanInputs {
        key: &key,
        base: base_field_set.as_ref(),
        local: &local_field_set,
        remote: &remote_field_set,
        converter_risk_codes: &risk_codes,
    });

    let available_transitions = if plan.transition.is_some() {
        match adapter.list_transitions(&key) {
            Ok(candidates) => candidates,
            Err(e) => {
                return PerIssueResult {
                    key,
                    action: "push".to_string(),
                    status: IssueStatus::Error,
                    messages: vec![Message::error(e.reason_code(), e.to_string())],
                };
            }
        }
    } else {
        Vec::new()
    };

    let (mut result, rewrite_snapshot) =
        execute_plan(adapter, &plan, description_payload, &available_transitions, options.dry_run);

    if rewrite_snapshot {
        if let Err(e) = store.write_snapshot(&key, &render(local)) {
            result.status = IssueStatus::Error;
            result.messages.push(Message::error(e.reason_code(), e.to_string()));
        }
    }

    result
}
