//! Core domain types shared by every component of the synchronizer.
//!
//! This crate holds pure data: canonical keys, the in-memory document shape,
//! the reason-code taxonomy, plans, per-issue results, and the output
//! envelope. It has no filesystem or network code — see `issync-document`,
//! `issync-fs`, `issync-lock`, `issync-transport`, `issync-store`, and
//! `issync-core` for the behavior built on top of these shapes.

mod cache;
mod clock;
mod document;
mod envelope;
mod key;
mod plan;
mod reason;
mod result;
mod transition;

pub mod duration_serde;

pub use cache::{Cache, CacheEntry};
pub use clock::{Clock, FixedClock, SystemClock};
pub use document::{Document, FrontMatter, SCHEMA_VERSION};
pub use envelope::{CommandInfo, Envelope};
pub use key::{CanonicalKey, KeyParseError};
pub use plan::{Action, BlockedField, FieldConflict, Plan, Transition, UpdateSet};
pub use reason::ReasonCode;
pub use result::{AggregateCounts, IssueStatus, Message, MessageLevel, PerIssueResult};
pub use transition::{
    TransitionCandidate, TransitionMatchKind, TransitionOutcome, TransitionSelection,
};

/// Outcome of comparing one field across base, local, and remote.
///
/// See `issync-core::three_way` for the function that produces this from a
/// triple and an equality predicate; this type only names the five outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    NoChange,
    LocalChanged,
    RemoteChanged,
    ConvergedChanged,
    Conflict,
}
