//! A filesystem capability confined to one absolute root.
//!
//! Every path handed to [`SafeFs`] must be relative and must clean to a
//! location inside the root; absolute input and input that would resolve
//! above the root fail with distinct error kinds. This is the single point
//! of enforcement for workspace escape checks — nothing in the rest of the
//! synchronizer touches the filesystem except through this type.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path must be relative, got absolute path: {0}")]
    Absolute(PathBuf),
    #[error("path escapes workspace root: {0}")]
    Escapes(PathBuf),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[derive(Debug, Clone)]
pub struct SafeFs {
    root: PathBuf,
}

impl SafeFs {
    /// `root` is taken as-is (not canonicalized) so tests can point at a
    /// `tempdir()` path that need not already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative, root-confined path to an absolute one, without
    /// touching the filesystem. Rejects absolute input and anything that
    /// lexically cleans to outside the root (e.g. `../../etc/passwd`).
    pub fn resolve(&self, rel: impl AsRef<Path>) -> Result<PathBuf, FsError> {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            return Err(FsError::Absolute(rel.to_path_buf()));
        }

        let mut depth: i64 = 0;
        let mut cleaned = PathBuf::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    cleaned.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(FsError::Escapes(rel.to_path_buf()));
                    }
                    cleaned.pop();
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FsError::Absolute(rel.to_path_buf()));
                }
            }
        }

        Ok(self.root.join(cleaned))
    }

    pub fn ensure_dir(&self, rel: impl AsRef<Path>) -> Result<(), FsError> {
        let path = self.resolve(rel)?;
        fs::create_dir_all(&path).map_err(|e| FsError::io(path, e))
    }

    /// Write via a temp sibling file then `rename`, so readers never observe
    /// a partially written file. If `path` already exists, its permission
    /// bits are copied onto the temp file before the rename, so a rewrite
    /// never silently resets a file back to the platform default mode.
    pub fn write_file_atomic(&self, rel: impl AsRef<Path>, contents: &[u8]) -> Result<(), FsError> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        let tmp_path = sibling_tmp_path(&path);
        fs::write(&tmp_path, contents).map_err(|e| FsError::io(&tmp_path, e))?;
        if let Ok(existing) = fs::metadata(&path) {
            fs::set_permissions(&tmp_path, existing.permissions()).map_err(|e| FsError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &path).map_err(|e| FsError::io(&path, e))?;
        Ok(())
    }

    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), FsError> {
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        fs::rename(&from, &to).map_err(|e| FsError::io(&to, e))
    }

    pub fn read_file(&self, rel: impl AsRef<Path>) -> Result<Vec<u8>, FsError> {
        let path = self.resolve(rel)?;
        fs::read(&path).map_err(|e| FsError::io(path, e))
    }

    pub fn read_to_string(&self, rel: impl AsRef<Path>) -> Result<String, FsError> {
        let path = self.resolve(rel)?;
        fs::read_to_string(&path).map_err(|e| FsError::io(path, e))
    }

    pub fn exists(&self, rel: impl AsRef<Path>) -> Result<bool, FsError> {
        Ok(self.resolve(rel)?.exists())
    }

    /// Removes a file. A missing file is not an error (matches the lock's
    /// "release is idempotent" policy for the same underlying operation).
    pub fn remove(&self, rel: impl AsRef<Path>) -> Result<(), FsError> {
        let path = self.resolve(rel)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io(path, e)),
        }
    }

    /// List the relative paths of every file under a root-confined directory,
    /// recursively, in arbitrary order (callers sort as needed).
    pub fn list_files(&self, rel: impl AsRef<Path>) -> Result<Vec<PathBuf>, FsError> {
        let base = self.resolve(rel)?;
        let mut out = Vec::new();
        if base.exists() {
            collect_files(&base, &base, &mut out).map_err(|e| FsError::io(&base, e))?;
        }
        Ok(out)
    }
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let tmp_name = format!(".{file_name}.tmp");
    path.with_file_name(tmp_name)
}

fn collect_files(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, out)?;
        } else {
            out.push(path.strip_prefix(base).expect("child of base").to_path_buf());
        }
    }
    Ok(())
}
