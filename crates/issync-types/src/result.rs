use crate::ReasonCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<ReasonCode>,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Info, reason_code: None, text: text.into() }
    }

    pub fn warning(reason_code: ReasonCode, text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Warning, reason_code: Some(reason_code), text: text.into() }
    }

    pub fn error(reason_code: ReasonCode, text: impl Into<String>) -> Self {
        Self { level: MessageLevel::Error, reason_code: Some(reason_code), text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Success,
    Warning,
    Conflict,
    Error,
    Skipped,
}

/// The per-issue outcome emitted by push, pull, and sync.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PerIssueResult {
    pub key: String,
    pub action: String,
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// Summed counts over a command run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AggregateCounts {
    pub processed: u64,
    pub updated: u64,
    pub created: u64,
    pub conflicts: u64,
    pub warnings: u64,
    pub errors: u64,
}

impl AggregateCounts {
    /// Field-wise sum, used when merging push and pull reports for sync.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            processed: self.processed + other.processed,
            updated: self.updated + other.updated,
            created: self.created + other.created,
            conflicts: self.conflicts + other.conflicts,
            warnings: self.warnings + other.warnings,
            errors: self.errors + other.errors,
        }
    }

    /// Record one per-issue result into the running totals.
    pub fn record(&mut self, result: &PerIssueResult) {
        self.processed += 1;
        match result.status {
            IssueStatus::Success => {}
            IssueStatus::Warning => self.warnings += 1,
            IssueStatus::Conflict => self.conflicts += 1,
            IssueStatus::Error => self.errors += 1,
            IssueStatus::Skipped => {}
        }
    }
}
