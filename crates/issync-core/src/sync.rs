//! Push-then-pull with fatal gating and report merging.

use issync_types::{AggregateCounts, Clock, PerIssueResult};

use crate::pull::{run_pull, PullError, PullOptions};
use crate::push::{run_push, PushError, PushOptions};
use crate::ports::{ContentConverter, RemoteAdapter};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("push stage failed: {0}")]
    Push(#[source] PushError),
    #[error("pull stage failed: {0}")]
    Pull(#[source] PullError),
}

pub struct SyncReport {
    pub results: Vec<PerIssueResult>,
    pub counts: AggregateCounts,
}

/// Runs push then pull. A push-stage fatal error returns immediately with
/// only the push report so far; a pull-stage fatal error returns the
/// *merged* push+pull report alongside the error.
pub fn run_sync(
    adapter: &dyn RemoteAdapter,
    converter: &dyn ContentConverter,
    store: &issync_store::WorkspaceStore,
    clock: &dyn Clock,
    push_options: &PushOptions,
    pull_options: &PullOptions,
) -> (SyncReport, Option<SyncError>) {
    let push_report = match run_push(adapter, converter, store, push_options) {
        Ok(report) => report,
        Err(e) => {
            return (SyncReport { results: Vec::new(), counts: AggregateCounts::default() }, Some(SyncError::Push(e)));
        }
    };

    match run_pull(adapter, converter, store, clock, pull_options) {
        Ok(pull_report) => {
            let mut results = push_report.results;
            results.extend(pull_report.results);
            (SyncReport { results, counts: push_report.counts.merge(&pull_report.counts) }, None)
        }
        Err(e) => {
            let merged = SyncReport { results: push_report.results, counts: push_report.counts };
            (merged, Some(SyncError::Pull(e)))
        }
    }
}
