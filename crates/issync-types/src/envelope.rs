use crate::{AggregateCounts, PerIssueResult};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub duration_ms: u64,
    pub dry_run: bool,
}

/// The single JSON result envelope every command emits in `--json` mode.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub envelope_version: String,
    pub command: CommandInfo,
    pub counts: AggregateCounts,
    pub issues: Vec<PerIssueResult>,
}

impl Envelope {
    pub const VERSION: &'static str = "1";

    pub fn new(command: CommandInfo, counts: AggregateCounts, issues: Vec<PerIssueResult>) -> Self {
        Self { envelope_version: Self::VERSION.to_string(), command, counts, issues }
    }

    /// `(counts, fatal?) -> exit code`, per the output-envelope contract.
    pub fn exit_code(counts: &AggregateCounts, fatal: bool) -> i32 {
        if fatal {
            1
        } else if counts.errors > 0 || counts.warnings > 0 || counts.conflicts > 0 {
            2
        } else {
            0
        }
    }
}
