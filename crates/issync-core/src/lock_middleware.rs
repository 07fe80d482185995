//! Wrap the mutating commands with a workspace lock lease ("Command
//! Lock Middleware"); read-only commands never call through here.

use std::path::Path;

use anyhow::Context;
use issync_lock::LockConfig;
use issync_types::Clock;

/// Commands that mutate the workspace and must hold the lock for their
/// whole duration. `status`, `list`, `view`, and `diff` are read-only and
/// skip this wrapper entirely.
pub const MUTATING_COMMANDS: &[&str] = &["init", "pull", "push", "sync", "new", "edit"];

pub fn command_requires_lock(name: &str) -> bool {
    MUTATING_COMMANDS.contains(&name)
}

/// Acquire the workspace lock, run `f`, and release. On success the lease
/// is released explicitly so its error (if any) surfaces to the caller; on
/// failure the lease's `Drop` impl releases it best-effort, matching the
/// reference stack's file-lock discipline.
pub fn with_workspace_lock<T>(
    root: &Path,
    config: &LockConfig,
    clock: &dyn Clock,
    f: impl FnOnce() -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut lease = issync_lock::acquire(root, config, clock).context("failed to acquire workspace lock")?;
    let result = f();
    if result.is_ok() {
        lease.release().context("failed to release workspace lock")?;
    }
    result
}
