//! Single-flight locking per installation target.
//!
//! Two reconciliations against the same settings file would race on flag
//! writes, so the CLI holds an exclusive advisory lock for the whole call.
//! The lock file is named after a hash of the target path, which keeps names
//! short and filesystem-safe.

use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{MonitorkitError, Result};

/// Held lock on one installation target. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    _file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock for `target` is free, then take it.
    pub fn acquire(lock_dir: &Path, target: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(lock_dir, target)?;
        tracing::debug!("Waiting for lock {}", path.display());
        file.lock_exclusive()?;
        tracing::debug!("Acquired lock {}", path.display());
        Ok(Self { _file: file, path })
    }

    /// Take the lock for `target`, failing with [`MonitorkitError::LockBusy`]
    /// if someone else holds it.
    pub fn try_acquire(lock_dir: &Path, target: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(lock_dir, target)?;
        if file.try_lock_exclusive().is_err() {
            return Err(MonitorkitError::LockBusy { path });
        }
        Ok(Self { _file: file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Stable lock file name for a target path.
///
/// 16 hex characters (8 bytes of SHA256).
pub fn lock_name(target: &Path) -> String {
    let hash = Sha256::digest(target.to_string_lossy().as_bytes());
    format!("{}.lock", hex::encode(&hash[..8]))
}

fn open_lock_file(lock_dir: &Path, target: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(lock_dir)?;
    let path = lock_dir.join(lock_name(target));

    // The file is never unlinked: removing a locked file would let a second
    // process lock a fresh inode at the same path.
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)?;

    Ok((file, path))
}
