// src/log/writer.rs

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::errors::{DeployerError, Result};
use crate::log::ENTRY_TIME_FORMAT;
use crate::types::OutputStream;

/// The active log of a single deployment task.
///
/// Shared (behind an `Arc`) between the runner and both output forwarders.
/// Each write holds the internal mutex for the whole write + sync, so lines
/// from different writers never interleave mid-line.
#[derive(Debug)]
pub struct DeploymentLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl DeploymentLog {
    /// Create the active log `dir/name`, truncating any previous content.
    ///
    /// Call this once per task; every later write appends to the same handle.
    pub async fn create(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|e| {
                DeployerError::LogFile(format!("failed to open log file {:?}: {e}", path))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Reopen an existing log `dir/name` for appending.
    ///
    /// Used after the task's own handle is closed, when an entry still has to
    /// reach the log (for example a failed rotation).
    pub async fn reopen(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                DeployerError::LogFile(format!("failed to reopen log file {:?}: {e}", path))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `[<timestamp>] <message>`.
    pub async fn write_entry(&self, message: &str) -> Result<()> {
        self.append(format!("[{}] {}\n", timestamp(), message)).await
    }

    /// Append `[<timestamp>] [<STREAM>] <line>`.
    pub async fn write_stream_line(&self, stream: OutputStream, line: &str) -> Result<()> {
        self.append(format!("[{}] [{}] {}\n", timestamp(), stream, line))
            .await
    }

    async fn append(&self, entry: String) -> Result<()> {
        let mut file = self.file.lock().await;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

fn timestamp() -> String {
    Local::now().format(ENTRY_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::ACTIVE_LOG_NAME;

    #[tokio::test]
    async fn entries_are_timestamped_and_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let log = DeploymentLog::create(dir.path(), ACTIVE_LOG_NAME)
            .await
            .unwrap();

        log.write_entry("hello").await.unwrap();
        log.write_stream_line(OutputStream::Stderr, "oops").await.unwrap();

        let body = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);

        // "[YYYY-MM-DD HH:MM:SS] " is 22 bytes.
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][20..], "] hello");
        assert_eq!(&lines[1][20..], "] [STDERR] oops");
    }

    #[tokio::test]
    async fn create_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACTIVE_LOG_NAME), "stale\nstale\n").unwrap();

        let log = DeploymentLog::create(dir.path(), ACTIVE_LOG_NAME)
            .await
            .unwrap();
        log.write_entry("fresh").await.unwrap();

        let body = std::fs::read_to_string(log.path()).unwrap();
        assert!(!body.contains("stale"));
        assert!(body.ends_with("] fresh\n"));
    }

    #[tokio::test]
    async fn reopen_appends_after_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let first = DeploymentLog::create(dir.path(), ACTIVE_LOG_NAME)
            .await
            .unwrap();
        first.write_entry("one").await.unwrap();
        drop(first);

        let again = DeploymentLog::reopen(dir.path(), ACTIVE_LOG_NAME)
            .await
            .unwrap();
        again.write_entry("two").await.unwrap();

        let body = std::fs::read_to_string(again.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] one"));
        assert!(lines[1].ends_with("] two"));
    }

    #[tokio::test]
    async fn reopen_requires_an_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeploymentLog::reopen(dir.path(), ACTIVE_LOG_NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployerError::LogFile(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_directory_is_a_log_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeploymentLog::create(&dir.path().join("gone"), ACTIVE_LOG_NAME)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployerError::LogFile(_)), "{err:?}");
    }
}
