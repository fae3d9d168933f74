// src/log/rotate.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::errors::{DeployerError, Result};
use crate::log::ROTATION_TIME_FORMAT;

/// Rename the active log `dir/active_name` to `<stem>_<YYYYMMDD_HHMMSS>.log`.
///
/// Returns the archived path, or `None` when there was no active log (a task
/// that failed before writing anything). Rotation is a rename, so the archived
/// file is byte-identical to the last state of the active log.
///
/// An existing archive with the same second-resolution name is never
/// overwritten; a `_1`, `_2`, ... suffix is added instead.
pub fn rotate_log(dir: &Path, active_name: &str) -> Result<Option<PathBuf>> {
    rotate_log_at(dir, active_name, Local::now())
}

pub(crate) fn rotate_log_at(
    dir: &Path,
    active_name: &str,
    at: DateTime<Local>,
) -> Result<Option<PathBuf>> {
    let active = dir.join(active_name);
    match fs::symlink_metadata(&active) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = ?active, "no active log to rotate");
            return Ok(None);
        }
        Err(e) => {
            return Err(DeployerError::LogRotation(format!(
                "failed to inspect {:?}: {e}",
                active
            )));
        }
    }

    let (stem, ext) = split_name(active_name);
    let stamp = at.format(ROTATION_TIME_FORMAT).to_string();
    let target = free_target(dir, stem, ext, &stamp);

    fs::rename(&active, &target).map_err(|e| {
        DeployerError::LogRotation(format!(
            "failed to rename {:?} to {:?}: {e}",
            active, target
        ))
    })?;

    info!(from = ?active, to = ?target, "rotated deployment log");
    Ok(Some(target))
}

/// List archived logs for `active_name` inside `dir`, oldest first.
pub fn rotated_logs(dir: &Path, active_name: &str) -> Result<Vec<PathBuf>> {
    let (stem, ext) = split_name(active_name);
    let prefix = format!("{stem}_");

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some((stamp, n)) = rotation_key(name, &prefix, ext) {
            found.push(((stamp.to_string(), n), entry.path()));
        }
    }

    // Zero-padded timestamp first, then the numeric collision suffix, so
    // `_10` sorts after `_2`. The unsuffixed name counts as 0.
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn split_name(active_name: &str) -> (&str, &str) {
    match active_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (active_name, ""),
    }
}

fn file_name(stem: &str, ext: &str, rest: &str) -> String {
    if ext.is_empty() {
        format!("{stem}_{rest}")
    } else {
        format!("{stem}_{rest}.{ext}")
    }
}

fn free_target(dir: &Path, stem: &str, ext: &str, stamp: &str) -> PathBuf {
    let mut candidate = dir.join(file_name(stem, ext, stamp));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = dir.join(file_name(stem, ext, &format!("{stamp}_{n}")));
        n += 1;
    }
    candidate
}

/// Split an archived name into its timestamp and collision suffix.
fn rotation_key<'a>(name: &'a str, prefix: &str, ext: &str) -> Option<(&'a str, u64)> {
    let rest = name.strip_prefix(prefix)?;
    let rest = if ext.is_empty() {
        rest
    } else {
        rest.strip_suffix(ext)?.strip_suffix('.')?
    };

    // YYYYMMDD_HHMMSS, optionally followed by _N.
    let bytes = rest.as_bytes();
    if bytes.len() < 15 || bytes[8] != b'_' {
        return None;
    }
    if !bytes[..8].iter().chain(&bytes[9..15]).all(u8::is_ascii_digit) {
        return None;
    }
    let (stamp, suffix) = rest.split_at(15);
    let n = match suffix {
        "" => 0,
        s => {
            let n = s.strip_prefix('_')?;
            if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            n.parse().ok()?
        }
    };
    Some((stamp, n))
}
