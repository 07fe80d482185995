/// The frozen, machine-readable outcome-code taxonomy. Every typed failure or
/// gated decision in the synchronizer carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ConflictFieldChangedBoth,
    ConflictBaseSnapshotMissing,
    DescriptionRiskyBlocked,
    DescriptionAdfBlockMissing,
    DescriptionAdfBlockMalformed,
    TransitionAmbiguous,
    TransitionUnavailable,
    UnsupportedFieldIgnored,
    ValidationFailed,
    AuthFailed,
    TransportError,
    LockAcquireFailed,
    LockStaleRecovered,
    DryRunNoWrite,
    TempIdRewriteOutOfScope,
}

impl ReasonCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConflictFieldChangedBoth => "conflict_field_changed_both",
            Self::ConflictBaseSnapshotMissing => "conflict_base_snapshot_missing",
            Self::DescriptionRiskyBlocked => "description_risky_blocked",
            Self::DescriptionAdfBlockMissing => "description_adf_block_missing",
            Self::DescriptionAdfBlockMalformed => "description_adf_block_malformed",
            Self::TransitionAmbiguous => "transition_ambiguous",
            Self::TransitionUnavailable => "transition_unavailable",
            Self::UnsupportedFieldIgnored => "unsupported_field_ignored",
            Self::ValidationFailed => "validation_failed",
            Self::AuthFailed => "auth_failed",
            Self::TransportError => "transport_error",
            Self::LockAcquireFailed => "lock_acquire_failed",
            Self::LockStaleRecovered => "lock_stale_recovered",
            Self::DryRunNoWrite => "dry_run_no_write",
            Self::TempIdRewriteOutOfScope => "temp_id_rewrite_out_of_scope",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
