// SPDX-License-Identifier: GPL-3.0-only

//! Cross-process advisory lock
//!
//! A single well-known lock file guards the mutation sequence; its content
//! is irrelevant. Acquisition is non-blocking: a worker that finds the
//! lock held treats that as "another instance is active" and exits
//! quietly. The guard releases on drop, so the lock is never leaked past
//! an error path.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

#[derive(Debug)]
pub struct ProcessLock {
    // Held open for the lifetime of the guard; closing releases the flock.
    _file: File,
    path: PathBuf,
}

impl ProcessLock {
    /// Try to take the exclusive lock without blocking.
    ///
    /// `Ok(None)` means another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EngineError::Lock {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| EngineError::Lock {
                path: path.to_path_buf(),
                source,
            })?;

        if !try_flock_exclusive(&file).map_err(|source| EngineError::Lock {
            path: path.to_path_buf(),
            source,
        })? {
            return Ok(None);
        }

        Ok(Some(Self {
            _file: file,
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Non-blocking exclusive `flock`. `Ok(false)` when another process holds
/// the lock.
fn try_flock_exclusive(file: &File) -> std::io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: fd is a valid descriptor owned by `file` for the duration of
    // the call; flock with LOCK_NB cannot block.
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        return Ok(true);
    }

    let error = std::io::Error::last_os_error();
    if error.kind() == std::io::ErrorKind::WouldBlock
        || error.raw_os_error() == Some(libc::EWOULDBLOCK)
    {
        return Ok(false);
    }
    Err(error)
}
