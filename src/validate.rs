// src/validate.rs

//! Input path validation for the `deploy` command.
//!
//! Runs before anything is persisted. Checks are evaluated in a fixed order
//! and the first failure wins, so the error always names one path and one
//! reason.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::debug;

use crate::errors::{DeployerError, Result};
use crate::fs::FileSystem;

/// Name prefix of the marker files used to check that the log directory is
/// writable. Each check uses its own `<prefix>_<pid>_<nanos>_<seq>` file.
pub const WRITE_PROBE_PREFIX: &str = ".deployer_write_probe";

static PROBE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Validate the three user-supplied paths of a deployment request.
///
/// Order of checks:
/// 1. project path absolute, then exists
/// 2. script path absolute, then exists
/// 3. log path absolute, exists, is a directory, then writable
///
/// The writability check creates and removes a uniquely named marker file
/// (see [`WRITE_PROBE_PREFIX`]) inside the log directory. Concurrent checks
/// against one directory never share a marker, and an existing file is
/// never opened.
pub fn validate_paths(
    fs: &dyn FileSystem,
    project: &Path,
    script: &Path,
    logs: &Path,
) -> Result<()> {
    ensure_absolute(project, "project path")?;
    ensure_exists(fs, project, "project path")?;

    ensure_absolute(script, "deployment script path")?;
    ensure_exists(fs, script, "deployment script path")?;

    ensure_absolute(logs, "log path")?;
    ensure_exists(fs, logs, "log path")?;
    if !fs.is_dir(logs) {
        return Err(DeployerError::validation(logs, "log path is not a directory"));
    }
    ensure_writable(fs, logs)?;

    debug!(?project, ?script, ?logs, "deployment paths validated");
    Ok(())
}

fn ensure_absolute(path: &Path, what: &str) -> Result<()> {
    if !path.is_absolute() {
        return Err(DeployerError::validation(
            path,
            format!("{what} must be absolute"),
        ));
    }
    Ok(())
}

fn ensure_exists(fs: &dyn FileSystem, path: &Path, what: &str) -> Result<()> {
    if !fs.exists(path) {
        return Err(DeployerError::validation(
            path,
            format!("{what} does not exist"),
        ));
    }
    Ok(())
}

fn probe_path(dir: &Path) -> PathBuf {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = PROBE_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "{WRITE_PROBE_PREFIX}_{}_{nanos}_{seq}",
        std::process::id()
    ))
}

fn ensure_writable(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    let probe = probe_path(dir);
    fs.create_new(&probe, b"")
        .map_err(|e| DeployerError::validation(dir, format!("log path is not writable: {e:#}")))?;
    fs.remove_file(&probe).map_err(|e| {
        DeployerError::validation(dir, format!("log path is not writable: {e:#}"))
    })?;
    Ok(())
}
