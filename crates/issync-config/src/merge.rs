use std::env;

use crate::{PullConfig, RemoteConfig, SyncConfig};

const PROJECT_KEY_ENV: &str = "ISSYNC_PROJECT_KEY";
const REMOTE_BASE_URL_ENV: &str = "ISSYNC_REMOTE_BASE_URL";
const REMOTE_EMAIL_ENV: &str = "ISSYNC_REMOTE_EMAIL";
const REMOTE_API_TOKEN_ENV: &str = "ISSYNC_REMOTE_API_TOKEN";

/// Build the env-var overlay to `merge` on top of a file-loaded config.
///
/// Only the fields a deployment would reasonably override per-invocation
/// (project key, remote credentials) are read from the environment; lock and
/// retry tuning stay file-only. Every other field starts out identical to
/// `base` so `merge` leaves it untouched when no matching var is set.
pub fn env_overlay(base: &SyncConfig) -> SyncConfig {
    let mut overlay = base.clone();
    if let Ok(value) = env::var(PROJECT_KEY_ENV) {
        overlay.project_key = Some(value);
    }
    if let Ok(value) = env::var(REMOTE_BASE_URL_ENV) {
        overlay.remote.base_url = Some(value);
    }
    if let Ok(value) = env::var(REMOTE_EMAIL_ENV) {
        overlay.remote.email = Some(value);
    }
    if let Ok(value) = env::var(REMOTE_API_TOKEN_ENV) {
        overlay.remote.api_token = Some(value);
    }
    overlay
}

/// Merge `base` with `overrides`, preferring `overrides`'s present fields.
/// Scalar `Option`s take the override when `Some`, and nested defaulted
/// records take the override's field whenever it differs from that
/// field's own default.
pub fn merge(base: &SyncConfig, overrides: &SyncConfig) -> SyncConfig {
    let default_pull = PullConfig::default();

    SyncConfig {
        root: if overrides.root != crate::default_root() { overrides.root.clone() } else { base.root.clone() },
        project_key: overrides.project_key.clone().or_else(|| base.project_key.clone()),
        remote: RemoteConfig {
            base_url: overrides.remote.base_url.clone().or_else(|| base.remote.base_url.clone()),
            email: overrides.remote.email.clone().or_else(|| base.remote.email.clone()),
            api_token: overrides.remote.api_token.clone().or_else(|| base.remote.api_token.clone()),
        },
        lock: overrides.lock.clone(),
        retry: overrides.retry.clone(),
        pull: PullConfig {
            page_size: if overrides.pull.page_size != default_pull.page_size {
                overrides.pull.page_size
            } else {
                base.pull.page_size
            },
            concurrency: if overrides.pull.concurrency != default_pull.concurrency {
                overrides.pull.concurrency
            } else {
                base.pull.concurrency
            },
        },
    }
}
