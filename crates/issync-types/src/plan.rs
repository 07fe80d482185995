use crate::ReasonCode;

/// The per-issue action a `Plan` resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Noop,
    Update,
    UpdatePartial,
    Blocked,
}

/// Optional per-field values the push executor should write to the remote.
/// A `None` field means "no local change for this field"; fields here are
/// always the *local* value, never a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdateSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl UpdateSet {
    /// Whether any field carries a value that should be written.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.labels.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
    }
}

/// A requested status transition, carrying only the target status name — the
/// transition resolver maps this to a concrete remote transition id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub target_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldConflict {
    pub field: String,
    pub reason_code: ReasonCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockedField {
    pub field: String,
    pub reason_codes: Vec<ReasonCode>,
    pub message: String,
}

/// The pure value produced by the push planner for one issue.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Plan {
    pub key: String,
    pub action: Action,
    pub updates: UpdateSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<FieldConflict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockedField>,
}

impl Plan {
    pub fn has_executable_changes(&self) -> bool {
        !self.updates.is_empty() || self.transition.is_some()
    }
}
