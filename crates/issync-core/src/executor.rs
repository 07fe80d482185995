//! Apply a [`Plan`] against the remote and, on full success, rewrite the
//! base snapshot.

use issync_types::{Action, IssueStatus, Message, PerIssueResult, Plan, ReasonCode, TransitionOutcome, TransitionSelection};

use crate::ports::{RemoteAdapter, RemoteError, RemoteUpdate, RemoteUpdateWithDescription};
use crate::transition::resolve_transition;

/// Execute `plan` against `adapter`. `description_payload` is the
/// already-converted remote rich-text for the plan's description update, if
/// any (the caller runs the content converter before calling this, so the
/// executor itself has no converter dependency).
///
/// Returns `(result, snapshot_should_be_rewritten)` — the caller rewrites
/// the base snapshot with the current canonical local rendering only when
/// the second element is `true`, inside the workspace lock's critical
/// section.
pub fn execute_plan(
    adapter: &dyn RemoteAdapter,
    plan: &Plan,
    description_payload: Option<serde_json::Value>,
    available_transitions: &[issync_types::TransitionCandidate],
    dry_run: bool,
) -> (PerIssueResult, bool) {
    if !plan.has_executable_changes() {
        let status = classify_blocked_only(plan);
        let mut messages = messages_for_blocks_and_conflicts(plan);
        if dry_run {
            messages.push(Message::warning(ReasonCode::DryRunNoWrite, "dry run: no write performed"));
        }
        return (result(plan, "noop", status, messages), false);
    }

    if dry_run {
        let mut messages = messages_for_blocks_and_conflicts(plan);
        messages.push(Message::warning(ReasonCode::DryRunNoWrite, "dry run: changes not written"));
        return (result(plan, "update", IssueStatus::Skipped, messages), false);
    }

    let mut messages = messages_for_blocks_and_conflicts(plan);
    let mut had_error = false;

    if !plan.updates.is_empty() {
        let update = RemoteUpdateWithDescription {
            fields: RemoteUpdate {
                summary: plan.updates.summary.clone(),
                labels: plan.updates.labels.clone(),
                assignee: plan.updates.assignee.clone(),
                priority: plan.updates.priority.clone(),
            },
            description: if plan.updates.description.is_some() { description_payload } else { None },
        };
        if let Err(e) = adapter.update_issue(&plan.key, update) {
            messages.push(Message::error(e.reason_code(), e.to_string()));
            had_error = true;
        }
    }

    let mut transition_skipped = false;
    if let Some(transition) = &plan.transition {
        let selection = TransitionSelection::Dynamic { target_status_name: transition.target_status.clone() };
        match resolve_transition(&selection, available_transitions) {
            TransitionOutcome::Selected { matched, .. } => {
                if let Err(e) = adapter.apply_transition(&plan.key, &matched.id) {
                    messages.push(Message::error(e.reason_code(), e.to_string()));
                    had_error = true;
                }
            }
            TransitionOutcome::Ambiguous { reason_code, .. } => {
                messages.push(Message::warning(reason_code, format!("transition to {} is ambiguous", transition.target_status)));
                transition_skipped = true;
            }
            TransitionOutcome::Unavailable { reason_code, .. } => {
                messages.push(Message::warning(reason_code, format!("no transition to {} is available", transition.target_status)));
                transition_skipped = true;
            }
        }
    }

    let status = if had_error {
        IssueStatus::Error
    } else if !plan.conflicts.is_empty() {
        IssueStatus::Conflict
    } else if !plan.blocks.is_empty() || transition_skipped {
        IssueStatus::Warning
    } else {
        IssueStatus::Success
    };

    let fully_applied = !had_error && plan.blocks.is_empty() && plan.conflicts.is_empty() && !transition_skipped;

    (result(plan, action_name(plan.action), status, messages), fully_applied)
}

fn classify_blocked_only(plan: &Plan) -> IssueStatus {
    if !plan.conflicts.is_empty() {
        IssueStatus::Conflict
    } else if !plan.blocks.is_empty() {
        IssueStatus::Warning
    } else {
        IssueStatus::Success
    }
}

fn messages_for_blocks_and_conflicts(plan: &Plan) -> Vec<Message> {
    let mut messages = Vec::new();
    for conflict in &plan.conflicts {
        messages.push(Message::warning(conflict.reason_code, conflict.message.clone()));
    }
    for block in &plan.blocks {
        for code in &block.reason_codes {
            messages.push(Message::warning(*code, block.message.clone()));
        }
    }
    messages
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Noop => "noop",
        Action::Update => "update",
        Action::UpdatePartial => "update_partial",
        Action::Blocked => "blocked",
    }
}

fn result(plan: &Plan, action: &str, status: IssueStatus, messages: Vec<Message>) -> PerIssueResult {
    PerIssueResult { key: plan.key.clone(), action: action.to_string(), status, messages }
}
