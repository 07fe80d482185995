use crate::ReasonCode;

/// How a caller selects a target transition among the remote's available set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionSelection {
    ById(String),
    ByName(String),
    /// Match the first candidate (in list order) whose `to_status_name`
    /// case-insensitively equals the given target.
    Dynamic { target_status_name: String },
}

/// One transition edge as reported by the remote tracker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TransitionCandidate {
    pub id: String,
    pub name: String,
    pub to_status_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionMatchKind {
    ById,
    ByName,
    Dynamic,
}

/// Result of resolving a `TransitionSelection` against a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Selected {
        kind: TransitionMatchKind,
        matched: TransitionCandidate,
        tried: Vec<TransitionCandidate>,
    },
    Ambiguous {
        matches: Vec<TransitionCandidate>,
        reason_code: ReasonCode,
    },
    Unavailable {
        tried: Vec<TransitionCandidate>,
        reason_code: ReasonCode,
    },
}
