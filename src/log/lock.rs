// src/log/lock.rs

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{DeployerError, Result};

/// Lock file created inside each log directory.
pub const LOCK_FILE_NAME: &str = ".deployment.lock";

/// Exclusive advisory lock on a log directory.
///
/// Held by the background worker from the moment it truncates the active log
/// until rotation has finished, so two tasks targeting the same directory run
/// one after the other. The lock is released when the guard is dropped (the
/// file descriptor closes). The lock file itself is left in place.
#[derive(Debug)]
pub struct LogDirLock {
    _file: File,
    path: PathBuf,
}

impl LogDirLock {
    /// Block until the lock on `dir` is acquired.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(dir)?;
        flock_exclusive(&file, true).map_err(|e| lock_error(&path, e))?;
        debug!(path = ?path, "log directory lock acquired");
        Ok(Self { _file: file, path })
    }

    /// Acquire the lock without blocking; `Ok(None)` if another process holds it.
    pub fn try_acquire(dir: &Path) -> Result<Option<Self>> {
        let (file, path) = open_lock_file(dir)?;
        match flock_exclusive(&file, false) {
            Ok(true) => Ok(Some(Self { _file: file, path })),
            Ok(false) => Ok(None),
            Err(e) => Err(lock_error(&path, e)),
        }
    }

    /// Async wrapper around [`LogDirLock::acquire`] that waits on a blocking
    /// thread instead of stalling the runtime.
    pub async fn acquire_async(dir: &Path) -> Result<Self> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire(&dir))
            .await
            .map_err(|e| DeployerError::LogFile(format!("lock task failed: {e}")))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(dir: &Path) -> Result<(File, PathBuf)> {
    let path = dir.join(LOCK_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| lock_error(&path, e))?;
    Ok((file, path))
}

fn lock_error(path: &Path, e: io::Error) -> DeployerError {
    DeployerError::LogFile(format!("failed to lock {:?}: {e}", path))
}

/// Take an exclusive `flock`. With `block = false`, returns `Ok(false)` if
/// the lock is held elsewhere.
fn flock_exclusive(file: &File, block: bool) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        let op = if block {
            libc::LOCK_EX
        } else {
            libc::LOCK_EX | libc::LOCK_NB
        };
        loop {
            // SAFETY: `fd` is a valid descriptor owned by `file` for the
            // duration of the call.
            let result = unsafe { libc::flock(fd, op) };
            if result == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock if !block => return Ok(false),
                _ => return Err(err),
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (file, block);
        Ok(true)
    }
}
