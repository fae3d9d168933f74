// src/task/file.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{DeployerError, Result};
use crate::fs::FileSystem;
use crate::task::record::DeploymentTask;

pub const TASK_FILE_PREFIX: &str = "deploy_task_";
pub const TASK_FILE_SUFFIX: &str = ".json";

/// Serialize `task` into a new, uniquely named file inside `dir`.
///
/// The file is fully written and synced before its path is returned. It is
/// *not* removed when this function returns: ownership passes to whichever
/// process later claims it with [`ClaimedTaskFile::claim`].
pub fn persist_task(task: &DeploymentTask, dir: &Path) -> Result<PathBuf> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TASK_FILE_PREFIX)
        .suffix(TASK_FILE_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| {
            DeployerError::TaskPersistence(format!(
                "failed to create temporary task file in {:?}: {e}",
                dir
            ))
        })?;

    serde_json::to_writer(tmp.as_file_mut(), task)
        .map_err(|e| DeployerError::TaskPersistence(format!("failed to serialize task: {e}")))?;

    let file = tmp.as_file_mut();
    file.flush()
        .and_then(|_| file.sync_all())
        .map_err(|e| DeployerError::TaskPersistence(format!("failed to write task file: {e}")))?;

    let (_file, path) = tmp.keep().map_err(|e| {
        DeployerError::TaskPersistence(format!("failed to keep task file: {}", e.error))
    })?;

    debug!(task_id = %task.task_id(), path = ?path, "task file written");
    Ok(path)
}

/// A task file taken over by the background worker.
///
/// The file is deleted exactly once: either explicitly through
/// [`ClaimedTaskFile::remove`], or when the claim is dropped (covering early
/// returns and unparseable files).
#[derive(Debug)]
pub struct ClaimedTaskFile {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    removed: bool,
}

impl ClaimedTaskFile {
    pub fn claim(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the task stored in the claimed file.
    pub fn read_task(&self) -> Result<DeploymentTask> {
        let body = self.fs.read_to_string(&self.path)?;
        let task = serde_json::from_str(&body).map_err(|e| {
            DeployerError::TaskPersistence(format!(
                "failed to parse task file {:?}: {e}",
                self.path
            ))
        })?;
        Ok(task)
    }

    /// Delete the task file now and report the outcome.
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        self.fs.remove_file(&self.path)?;
        debug!(path = ?self.path, "task file removed");
        Ok(())
    }
}

impl Drop for ClaimedTaskFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = self.fs.remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "failed to remove task file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn persisted_task_round_trips_through_claim() {
        let dir = tempfile::tempdir().unwrap();
        let task = DeploymentTask::new("/srv/app", "/srv/app/deploy.sh", "/var/log/app");

        let path = persist_task(&task, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(TASK_FILE_PREFIX));
        assert!(name.ends_with(TASK_FILE_SUFFIX));

        let claim = ClaimedTaskFile::claim(Arc::new(RealFileSystem), &path);
        assert_eq!(claim.read_task().unwrap(), task);
        claim.remove().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn each_persist_gets_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let task = DeploymentTask::new("/a", "/a/s.sh", "/l");

        let first = persist_task(&task, dir.path()).unwrap();
        let second = persist_task(&task, dir.path()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn persist_into_missing_dir_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let task = DeploymentTask::new("/a", "/a/s.sh", "/l");

        let err = persist_task(&task, &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DeployerError::TaskPersistence(_)), "{err:?}");
    }

    #[test]
    fn dropping_a_claim_removes_unparseable_file() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/tmp/deploy_task_x.json", "not json");

        {
            let claim = ClaimedTaskFile::claim(fs.clone(), "/tmp/deploy_task_x.json");
            let err = claim.read_task().unwrap_err();
            assert!(matches!(err, DeployerError::TaskPersistence(_)));
        }

        assert!(!fs.exists(Path::new("/tmp/deploy_task_x.json")));
    }
}
