use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use deployer::errors::{DeployerError, Result};
use deployer::exec::BackgroundSpawner;

/// A spawner that records which task files it was asked to start, without
/// starting anything. Tests can then run the worker inline.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpawner {
    spawned: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawned(&self) -> Vec<PathBuf> {
        self.spawned.lock().unwrap().clone()
    }
}

impl BackgroundSpawner for RecordingSpawner {
    fn spawn_worker(&self, task_file: &Path) -> Result<()> {
        self.spawned.lock().unwrap().push(task_file.to_path_buf());
        Ok(())
    }
}

/// A spawner whose every attempt fails, as if the executable had vanished.
#[derive(Debug, Clone, Default)]
pub struct FailingSpawner;

impl BackgroundSpawner for FailingSpawner {
    fn spawn_worker(&self, task_file: &Path) -> Result<()> {
        Err(DeployerError::Spawn(format!(
            "refusing to spawn worker for {:?}",
            task_file
        )))
    }
}
