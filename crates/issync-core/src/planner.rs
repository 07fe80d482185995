//! Compose per-field three-way comparisons into one per-issue [`Plan`].

use issync_types::{Action, BlockedField, ComparisonOutcome, Document, FieldConflict, Plan, ReasonCode, Transition, UpdateSet};

use crate::three_way::{self, labels_equal};

/// The per-field values compared by the planner, independent of where they
/// came from (a parsed `Document`, a converted `RemoteIssue`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub key: String,
    pub summary: String,
    pub description_markdown: String,
    pub description_rich_text: Option<serde_json::Value>,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub status: String,
}

impl FieldSet {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            key: doc.canonical_key.as_str().to_string(),
            summary: doc.front_matter.summary.clone(),
            description_markdown: doc.markdown_body.clone(),
            description_rich_text: doc.raw_rich_text_json.clone(),
            labels: doc.front_matter.labels.iter().cloned().collect(),
            assignee: doc.front_matter.assignee.clone(),
            priority: doc.front_matter.priority.clone(),
            status: doc.front_matter.status.clone(),
        }
    }
}

pub struct PlanInputs<'a> {
    pub key: &'a str,
    pub base: Option<&'a FieldSet>,
    pub local: &'a FieldSet,
    pub remote: &'a FieldSet,
    /// Risk signals the content converter reported for this description
    /// write (risk-gate source (ii)); source (i) — the base
    /// snapshot carrying a rich-text block the local document lacks — is
    /// derived here from `base`/`local` directly.
    pub converter_risk_codes: &'a [ReasonCode],
}

const FIELD_ORDER: &[&str] = &["summary", "description", "labels", "assignee", "priority", "status"];

pub fn build_plan(inputs: &PlanInputs) -> Plan {
    let mut blocks = Vec::new();

    if inputs.base.is_none() {
        blocks.push(BlockedField {
            field: "*".to_string(),
            reason_codes: vec![ReasonCode::ConflictBaseSnapshotMissing],
            message: format!("no base snapshot for {}", inputs.key),
        });
        return Plan {
            key: inputs.key.to_string(),
            action: Action::Blocked,
            updates: UpdateSet::default(),
            transition: None,
            conflicts: Vec::new(),
            blocks,
        };
    }
    let base = inputs.base.expect("checked above");

    let keys = [inputs.key, base.key.as_str(), inputs.local.key.as_str(), inputs.remote.key.as_str()];
    if keys.iter().any(|k| *k != inputs.key) {
        blocks.push(BlockedField {
            field: "*".to_string(),
            reason_codes: vec![ReasonCode::ValidationFailed],
            message: format!("key mismatch across local/base/remote for {}", inputs.key),
        });
        return Plan {
            key: inputs.key.to_string(),
            action: Action::Blocked,
            updates: UpdateSet::default(),
            transition: None,
            conflicts: Vec::new(),
            blocks,
        };
    }

    let mut updates = UpdateSet::default();
    let mut conflicts = Vec::new();
    let mut transition = None;

    for field in FIELD_ORDER {
        match *field {
            "summary" => {
                let outcome = three_way::compare(&base.summary, &inputs.local.summary, &inputs.remote.summary, |a, b| a == b);
                match outcome {
                    ComparisonOutcome::LocalChanged => updates.summary = Some(inputs.local.summary.clone()),
                    ComparisonOutcome::Conflict => conflicts.push(conflict("summary")),
                    _ => {}
                }
            }
            "description" => {
                let outcome = three_way::compare(
                    &base.description_markdown,
                    &inputs.local.description_markdown,
                    &inputs.remote.description_markdown,
                    |a, b| a == b,
                );
                match outcome {
                    ComparisonOutcome::LocalChanged => {
                        let mut risk_codes = inputs.converter_risk_codes.to_vec();
                        if base.description_rich_text.is_some() && inputs.local.description_rich_text.is_none() {
                            risk_codes.push(ReasonCode::DescriptionAdfBlockMissing);
                        }
                        if risk_codes.is_empty() {
                            updates.description = Some(inputs.local.description_markdown.clone());
                        } else {
                            blocks.push(BlockedField {
                                field: "description".to_string(),
                                reason_codes: {
                                    let mut codes = vec![ReasonCode::DescriptionRiskyBlocked];
                                    codes.extend(risk_codes);
                                    codes
                                },
                                message: "description write blocked by risk gate".to_string(),
                            });
                        }
                    }
                    ComparisonOutcome::Conflict => conflicts.push(conflict("description")),
                    _ => {}
                }
            }
            "labels" => {
                let outcome =
                    three_way::compare(&base.labels, &inputs.local.labels, &inputs.remote.labels, |a, b| labels_equal(a, b));
                match outcome {
                    ComparisonOutcome::LocalChanged => updates.labels = Some(inputs.local.labels.clone()),
                    ComparisonOutcome::Conflict => conflicts.push(conflict("labels")),
                    _ => {}
                }
            }
            "assignee" => {
                let outcome =
                    three_way::compare(&base.assignee, &inputs.local.assignee, &inputs.remote.assignee, |a, b| a == b);
                match outcome {
                    ComparisonOutcome::LocalChanged => updates.assignee = inputs.local.assignee.clone(),
                    ComparisonOutcome::Conflict => conflicts.push(conflict("assignee")),
                    _ => {}
                }
            }
            "priority" => {
                let outcome =
                    three_way::compare(&base.priority, &inputs.local.priority, &inputs.remote.priority, |a, b| a == b);
                match outcome {
                    ComparisonOutcome::LocalChanged => updates.priority = inputs.local.priority.clone(),
                    ComparisonOutcome::Conflict => conflicts.push(conflict("priority")),
                    _ => {}
                }
            }
            "status" => {
                let outcome = three_way::compare(&base.status, &inputs.local.status, &inputs.remote.status, |a, b| a == b);
                match outcome {
                    ComparisonOutcome::LocalChanged => {
                        transition = Some(Transition { target_status: inputs.local.status.clone() })
                    }
                    ComparisonOutcome::Conflict => conflicts.push(conflict("status")),
                    _ => {}
                }
            }
            _ => unreachable!(),
        }
    }

    let has_changes = !updates.is_empty() || transition.is_some();
    let action = if has_changes && (!blocks.is_empty() || !conflicts.is_empty()) {
        Action::UpdatePartial
    } else if has_changes {
        Action::Update
    } else if !blocks.is_empty() {
        Action::Blocked
    } else {
        Action::Noop
    };

    Plan { key: inputs.key.to_string(), action, updates, transition, conflicts, blocks }
}

fn conflict(field: &str) -> FieldConflict {
    FieldConflict {
        field: field.to_string(),
        reason_code: ReasonCode::ConflictFieldChangedBoth,
        message: format!("{field} changed both locally and on the remote"),
    }
}
