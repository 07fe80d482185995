//! Capability interfaces the engine depends on but does not implement:
//! the remote issue tracker and the description content converter. Both
//! are modeled as traits so the planner/executor/pipeline can be exercised
//! against in-memory fakes with no network I/O, the same port pattern the
//! reference stack uses for its storage and state backends.

use issync_types::{ReasonCode, TransitionCandidate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub id: String,
    pub display_name: Option<String>,
}

/// One issue as reported by the remote tracker. `description` is the
/// tracker's native rich-text JSON, opaque to everything except the content
/// converter.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteIssue {
    pub key: String,
    pub summary: String,
    pub description: Option<serde_json::Value>,
    pub labels: Vec<String>,
    pub assignee: Option<AccountRef>,
    pub reporter: Option<AccountRef>,
    pub priority: Option<NamedRef>,
    pub issue_type: NamedRef,
    pub status: NamedRef,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub start_at: u64,
    pub max_results: u64,
    pub total: u64,
    pub next_page_token: Option<String>,
    pub is_last: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub page: SearchPage,
    pub issues: Vec<RemoteIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub summary: Option<String>,
    pub labels: Option<Vec<String>>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUpdateWithDescription {
    pub fields: RemoteUpdate,
    pub description: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueRequest {
    pub project_key: String,
    pub issue_type_name: String,
    pub summary: String,
    pub labels: Vec<String>,
    pub assignee_account_id: Option<String>,
    pub priority_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIssueRequestWithDescription {
    pub base: CreateIssueRequest,
    pub description: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    pub self_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("authentication failed for {operation}")]
    Auth { operation: String },
    #[error("transport error during {operation}: {message}")]
    Transport { operation: String, message: String },
    #[error("unexpected status {status} during {operation}: {message}")]
    UnexpectedStatus { operation: String, status: u16, message: String },
}

impl RemoteError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            RemoteError::Auth { .. } => ReasonCode::AuthFailed,
            RemoteError::Transport { .. } | RemoteError::UnexpectedStatus { .. } => ReasonCode::TransportError,
        }
    }
}

/// The remote issue tracker, consumed as an abstract port.
pub trait RemoteAdapter {
    fn search_issues(
        &self,
        query: &str,
        start_at: u64,
        max_results: u64,
        next_page_token: Option<&str>,
    ) -> Result<SearchResult, RemoteError>;

    fn get_issue(&self, key: &str) -> Result<RemoteIssue, RemoteError>;

    fn create_issue(&self, request: CreateIssueRequestWithDescription) -> Result<CreatedIssue, RemoteError>;

    fn update_issue(&self, key: &str, update: RemoteUpdateWithDescription) -> Result<(), RemoteError>;

    fn list_transitions(&self, key: &str) -> Result<Vec<TransitionCandidate>, RemoteError>;

    fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedDescription {
    pub payload: serde_json::Value,
    /// Risk signals surfaced by the converter itself (distinct from the
    /// planner's own raw-block-missing/malformed checks).
    pub risk_codes: Vec<ReasonCode>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("description content is malformed: {0}")]
    Malformed(String),
}

impl ConvertError {
    pub fn reason_code(&self) -> ReasonCode {
        ReasonCode::DescriptionAdfBlockMalformed
    }
}

/// The description converter, consumed as an abstract port. Its JSON shape
/// is the remote tracker's native rich-text representation; this crate
/// never interprets it beyond "present or not."
pub trait ContentConverter {
    fn markdown_to_remote(&self, markdown: &str, rich_text: Option<&serde_json::Value>) -> Result<ConvertedDescription, ConvertError>;

    fn remote_to_markdown(&self, payload: &serde_json::Value) -> Result<(String, Option<serde_json::Value>), ConvertError>;
}
