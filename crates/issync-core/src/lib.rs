//! # issync-core
//!
//! The deterministic three-way issue-synchronization engine: plan, execute,
//! and report every push/pull/sync operation over a workspace of issue
//! files, without ever guessing at a conflict.
//!
//! ## Pipeline
//!
//! - **pull**: [`pull::run_pull`] fetches remote issues page by page, builds
//!   their canonical document form, and writes or suppresses them.
//! - **push**: [`push::run_push`] walks every workspace file and routes it
//!   to either the draft publisher or the three-way planner/executor pair.
//! - **sync**: [`sync::run_sync`] runs push then pull, merging their reports
//!   under the fatal-gating rules described in `sync`.
//!
//! ## Modules
//!
//! - [`ports`] — `RemoteAdapter`/`ContentConverter` trait seams and their
//!   shared value types.
//! - [`three_way`] — the base/local/remote comparator at the heart of every
//!   plan.
//! - [`transition`] — status-transition resolution (by id, by name, or
//!   dynamically by target status name).
//! - [`planner`] — builds a [`planner::PlanInputs`] triple into a `Plan`.
//! - [`executor`] — executes a `Plan` against a `RemoteAdapter`.
//! - [`draft`] — publishes a local-draft (`L-<hex>`) issue as a new remote
//!   issue, idempotently.
//! - [`pull`] — the pull pipeline: search, paginate, convert, suppress
//!   unchanged, write.
//! - [`push`] — the per-workspace push driver tying planner, executor, and
//!   draft publisher together.
//! - [`sync`] — push-then-pull orchestration.
//! - [`lock_middleware`] — wraps mutating commands with the workspace lock.
//! - [`inspection`] — read-only `list`/`status`/`diff` analyses.

pub mod draft;
pub mod executor;
pub mod inspection;
pub mod lock_middleware;
pub mod planner;
pub mod ports;
pub mod pull;
pub mod push;
pub mod sync;
pub mod three_way;
pub mod transition;
