//! Exclusive on-disk lease over a workspace root, with stale-lock recovery.
//!
//! `acquire` creates `<root>/.sync/lock` with create-new + mode 0600 semantics
//! (the Unix equivalent of `O_CREAT|O_EXCL|O_WRONLY`). A collision is resolved
//! by checking the existing file's modification time against `stale_after`:
//! stale locks are removed and the acquisition retried in the same call, with
//! the returned lease reporting `recovered_stale`; a lock that is not stale is
//! polled for at `poll_interval` until `acquire_timeout` elapses.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use issync_types::{Clock, ReasonCode};
use serde::{Deserialize, Serialize};

pub const LOCK_FILE: &str = "lock";
const LOCK_MODE: u32 = 0o600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_stale_after", with = "humantime_serde")]
    pub stale_after: Duration,
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

fn default_stale_after() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after: default_stale_after(),
            poll_interval: default_poll_interval(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}

/// JSON metadata written into the lock file for whoever inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to create lock directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write lock file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove lock file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read lock metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("lock info at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("timed out after {waited:?} waiting for lock at {path}")]
    Timeout { path: PathBuf, waited: Duration },
}

impl LockError {
    pub fn reason_code(&self) -> &'static str {
        ReasonCode::LockAcquireFailed.as_str()
    }
}

/// A held lock. Releases on `Drop` as a best effort if `release` was never
/// called explicitly.
#[derive(Debug)]
pub struct Lease {
    path: PathBuf,
    released: bool,
    pub recovered_stale: bool,
}

impl Lease {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file. Idempotent: a missing file is not an error.
    pub fn release(&mut self) -> Result<(), LockError> {
        if self.released {
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(LockError::Remove { path: self.path.clone(), source: e }),
        }
        self.released = true;
        Ok(())
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(".sync").join(LOCK_FILE)
}

pub fn is_locked(root: &Path) -> bool {
    lock_path(root).exists()
}

pub fn read_lock_info(root: &Path) -> Result<LockInfo, LockError> {
    let path = lock_path(root);
    let content = fs::read_to_string(&path)
        .map_err(|e| LockError::Metadata { path: path.clone(), source: e })?;
    serde_json::from_str(&content).map_err(|e| LockError::Corrupt { path, source: e })
}

/// Acquire the lock at `<root>/.sync/lock`, polling until `config.acquire_timeout`
/// elapses. A lock file whose modification time is older than `config.stale_after`
/// is removed and the acquisition retried within this same call.
pub fn acquire(root: &Path, config: &LockConfig, clock: &dyn Clock) -> Result<Lease, LockError> {
    let dir = root.join(".sync");
    fs::create_dir_all(&dir).map_err(|e| LockError::CreateDir { path: dir.clone(), source: e })?;
    let path = dir.join(LOCK_FILE);

    let deadline = Instant::now() + config.acquire_timeout;
    let mut recovered_stale = false;

    loop {
        match create_exclusive(&path, clock) {
            Ok(()) => return Ok(Lease { path, released: false, recovered_stale }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if is_stale(&path, config.stale_after)? {
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(LockError::Remove { path: path.clone(), source: e }),
                    }
                    recovered_stale = true;
                    continue;
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(LockError::Timeout { path: path.clone(), waited: config.acquire_timeout });
                }
                std::thread::sleep(config.poll_interval.min(remaining));
            }
            Err(e) => return Err(LockError::Write { path: path.clone(), source: e }),
        }
    }
}

fn create_exclusive(path: &Path, clock: &dyn Clock) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).mode(LOCK_MODE).open(path)?;
    let info = LockInfo { pid: std::process::id(), created_at: clock.now() };
    let json = serde_json::to_string_pretty(&info).expect("LockInfo always serializes");
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn is_stale(path: &Path, stale_after: Duration) -> Result<bool, LockError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(LockError::Metadata { path: path.to_path_buf(), source: e }),
    };
    let modified = metadata
        .modified()
        .map_err(|e| LockError::Metadata { path: path.to_path_buf(), source: e })?;
    Ok(modified.elapsed().map(|age| age > stale_after).unwrap_or(false))
}
