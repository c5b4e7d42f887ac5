//! Single-flight locks keyed by label or CLI context.
//!
//! Each key maps to a lock file under the configured lock directory. The
//! lock is an exclusive advisory `flock`, so it serializes both threads and
//! separate processes and is released when the holder is dropped (or the
//! process dies).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{DeployError, Result};
use crate::paths;

#[derive(Debug)]
pub struct NamespaceLock {
    key: String,
    path: PathBuf,
    // Held for its lock; closing the file releases it.
    _file: File,
}

impl NamespaceLock {
    /// Block until the lock for `key` is held.
    pub fn acquire(dir: &Path, key: &str) -> Result<Self> {
        let (path, file) = open(dir, key)?;
        tracing::debug!(key, path = %path.display(), "waiting for namespace lock");
        FileExt::lock_exclusive(&file).map_err(|e| DeployError::Lock {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(key, "namespace lock held");
        Ok(Self {
            key: key.to_string(),
            path,
            _file: file,
        })
    }
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        tracing::debug!(key = %self.key, path = %self.path.display(), "namespace lock released");
    }
}

fn open(dir: &Path, key: &str) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir).map_err(|e| DeployError::Lock {
        key: key.to_string(),
        message: format!("cannot create {}: {e}", dir.display()),
    })?;
    let path = dir.join(paths::lock_file_name(key));
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| DeployError::Lock {
            key: key.to_string(),
            message: format!("cannot open {}: {e}", path.display()),
        })?;
    Ok((path, file))
}
