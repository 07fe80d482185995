//! The typed, defaulted `.sync/config.json` record.
//!
//! Discovery, on-disk reading, and validation live here rather than in
//! `issync-core`: the core's entry points only ever take an already-built
//! [`SyncConfig`] value, keeping "a typed config crate" separate from
//! "a core that consumes a typed record."

mod merge;

pub use merge::{env_overlay, merge};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use issync_lock::LockConfig;
use issync_transport::TransportConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".sync";
pub const CONFIG_FILE: &str = "config.json";

fn default_root() -> PathBuf {
    PathBuf::from(".issues")
}

fn default_page_size() -> u32 {
    100
}

fn default_concurrency() -> usize {
    4
}

/// The top-level config record consumed by every `issync-core` entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Required only for draft publish.
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub lock: LockConfig,
    /// Transport timeout, attempt count, and backoff base — consumed
    /// directly by `issync-transport::RetryingTransport`.
    #[serde(default)]
    pub retry: TransportConfig,
    #[serde(default)]
    pub pull: PullConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            project_key: None,
            remote: RemoteConfig::default(),
            lock: LockConfig::default(),
            retry: TransportConfig::default(),
            pull: PullConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
}

impl RemoteConfig {
    /// Every string that must never appear unredacted in an error message:
    /// the raw token, the basic-auth `email:token` composite, and the
    /// header value built from it.
    pub fn secrets(&self) -> Vec<String> {
        let mut secrets = Vec::new();
        if let Some(token) = &self.api_token {
            secrets.push(token.clone());
        }
        if let (Some(email), Some(token)) = (&self.email, &self.api_token) {
            use base64::Engine;
            let composite = format!("{email}:{token}");
            let encoded = base64::engine::general_purpose::STANDARD.encode(composite.as_bytes());
            secrets.push(format!("{email}:{token}"));
            secrets.push(format!("Basic {encoded}"));
        }
        secrets
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self { page_size: default_page_size(), concurrency: default_concurrency() }
    }
}

/// Walk up from `start_dir` looking for `<dir>/.sync/config.json`, stopping
/// at the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        let candidate = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Load a config from an explicit file path. A missing file yields defaults
/// rather than an error, so a fresh workspace still has something to run
/// `init` against.
pub fn load_config_from_file(path: &Path) -> Result<SyncConfig> {
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Discover and load starting from `start_dir`; defaults if none is found.
/// The on-disk record is then merged with an env-var overlay ([`env_overlay`]),
/// so `ISSYNC_REMOTE_API_TOKEN` and friends win over whatever is checked in.
pub fn load_config(start_dir: &Path) -> Result<SyncConfig> {
    let file_config = match find_config(start_dir) {
        Some(path) => load_config_from_file(&path)?,
        None => SyncConfig::default(),
    };
    let overlay = env_overlay(&file_config);
    Ok(merge(&file_config, &overlay))
}

pub fn save_config(root: &Path, config: &SyncConfig) -> Result<()> {
    let dir = root.join(CONFIG_DIR);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(CONFIG_FILE);
    let content = serde_json::to_string_pretty(config).context("failed to serialize config to JSON")?;
    std::fs::write(&path, content).with_context(|| format!("failed to write config file: {}", path.display()))?;
    Ok(())
}
