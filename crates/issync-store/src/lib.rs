//! The canonical on-disk workspace layout: `open/`, `closed/`, and `.sync/`
//! (lock, cache, base snapshots), plus the issue cache and base-snapshot
//! read/write operations built over [`issync_fs::SafeFs`].

mod error;

pub use error::StoreError;

use std::path::{Path, PathBuf};

use issync_fs::SafeFs;
use issync_types::{Cache, CacheEntry};

pub const OPEN_DIR: &str = "open";
pub const CLOSED_DIR: &str = "closed";
pub const SYNC_DIR: &str = ".sync";
pub const ORIGINALS_DIR: &str = ".sync/originals";
pub const CACHE_FILE: &str = ".sync/cache.json";

/// Remote status names (case-insensitive) that bucket an issue under
/// `closed/` instead of `open/`.
const CLOSED_STATUSES: &[&str] =
    &["done", "closed", "resolved", "complete", "completed", "rejected", "declined", "cancelled", "won't do"];

pub fn bucket_for_status(status: &str) -> &'static str {
    if CLOSED_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status)) { CLOSED_DIR } else { OPEN_DIR }
}

pub fn snapshot_rel_path(key: &str) -> PathBuf {
    Path::new(ORIGINALS_DIR).join(format!("{key}.md"))
}

/// Thin wrapper over [`SafeFs`] that knows the workspace's directory
/// conventions and the cache/snapshot file formats.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    fs: SafeFs,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { fs: SafeFs::new(root) }
    }

    pub fn fs(&self) -> &SafeFs {
        &self.fs
    }

    pub fn root(&self) -> &Path {
        self.fs.root()
    }

    /// Create `open/`, `closed/`, and `.sync/originals/` if they do not
    /// already exist. Idempotent; used by `init` and safe to call before
    /// any other operation.
    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        self.fs.ensure_dir(OPEN_DIR)?;
        self.fs.ensure_dir(CLOSED_DIR)?;
        self.fs.ensure_dir(ORIGINALS_DIR)?;
        Ok(())
    }

    pub fn load_cache(&self) -> Result<Cache, StoreError> {
        if !self.fs.exists(CACHE_FILE)? {
            return Ok(Cache::new());
        }
        let raw = self.fs.read_to_string(CACHE_FILE)?;
        serde_json::from_str(&raw).map_err(|source| StoreError::MalformedCache { path: CACHE_FILE.to_string(), source })
    }

    pub fn save_cache(&self, cache: &Cache) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(cache).expect("Cache always serializes");
        self.fs.write_file_atomic(CACHE_FILE, contents.as_bytes())?;
        Ok(())
    }

    pub fn read_snapshot(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rel = snapshot_rel_path(key);
        if !self.fs.exists(&rel)? {
            return Ok(None);
        }
        Ok(Some(self.fs.read_to_string(rel)?))
    }

    pub fn write_snapshot(&self, key: &str, canonical: &str) -> Result<(), StoreError> {
        self.fs.write_file_atomic(snapshot_rel_path(key), canonical.as_bytes())?;
        Ok(())
    }

    pub fn remove_snapshot(&self, key: &str) -> Result<(), StoreError> {
        self.fs.remove(snapshot_rel_path(key))?;
        Ok(())
    }

    /// Atomically write an issue file into `open/` or `closed/` as dictated
    /// by `status`, returning the path it was written to (relative to
    /// root). Any stale copy at `remove_if_present` (the previously cached
    /// path, when it differs) is removed afterward.
    pub fn write_issue_file(
        &self,
        filename: &str,
        status: &str,
        contents: &str,
        remove_if_present: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        let bucket = bucket_for_status(status);
        let rel = Path::new(bucket).join(filename);
        self.fs.write_file_atomic(&rel, contents.as_bytes())?;

        if let Some(stale) = remove_if_present {
            if stale != rel.to_string_lossy().as_ref() {
                self.fs.remove(stale)?;
            }
        }

        Ok(rel)
    }

    pub fn read_issue_file(&self, rel_path: impl AsRef<Path>) -> Result<String, StoreError> {
        Ok(self.fs.read_to_string(rel_path)?)
    }

    /// Every `.md` file under `open/` and `closed/`, relative to root, in
    /// arbitrary order (callers sort by key for deterministic output).
    pub fn list_issue_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();
        for dir in [OPEN_DIR, CLOSED_DIR] {
            for path in self.fs.list_files(dir)? {
                if path.extension().and_then(|e| e.to_str()) == Some("md") {
                    files.push(Path::new(dir).join(path));
                }
            }
        }
        Ok(files)
    }

    pub fn cache_entry(path: &Path, status: &str, remote_updated_at: Option<String>) -> CacheEntry {
        CacheEntry { path: path.to_string_lossy().into_owned(), status: status.to_string(), remote_updated_at }
    }
}
