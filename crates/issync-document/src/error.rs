use issync_types::ReasonCode;

/// Typed parse-error taxonomy for one issue file.
///
/// Every variant but [`ParseError::MalformedRawBlock`] maps to
/// [`ReasonCode::ValidationFailed`]; the raw block gets its own code because
/// a malformed `jira-adf` fence is specifically what the push planner's
/// description risk gate looks for.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document must open and close with a `---` front-matter delimiter")]
    MalformedDocument,

    #[error("malformed front-matter line: {0:?}")]
    MalformedFrontMatter(String),

    #[error("unsupported front-matter field: {0:?}")]
    UnsupportedField(String),

    #[error("missing required front-matter field: {0}")]
    MissingRequiredField(&'static str),

    #[error("invalid schema_version: expected \"1\", got {0:?}")]
    InvalidSchemaVersion(String),

    #[error("invalid issue key: {0:?}")]
    InvalidIssueKey(String),

    #[error("malformed jira-adf block: {0}")]
    MalformedRawBlock(String),

    #[error("required field {field} has an empty value")]
    InvalidRequiredValue { field: &'static str },
}

impl ParseError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::MalformedRawBlock(_) => ReasonCode::DescriptionAdfBlockMalformed,
            _ => ReasonCode::ValidationFailed,
        }
    }
}
