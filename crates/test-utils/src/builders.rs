#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use deployer::config::DeployerConfig;
use deployer::exec::DeployRequest;
use deployer::log::{rotated_logs, ACTIVE_LOG_NAME};
use deployer::task::{DeploymentTask, TASK_FILE_PREFIX};

/// Scratch layout for one deployment:
///
/// ```text
/// <tmp>/project/deploy.sh
/// <tmp>/logs/
/// <tmp>/tasks/
/// ```
pub struct DeploymentFixture {
    root: TempDir,
    project: PathBuf,
    script: PathBuf,
    logs: PathBuf,
    tasks: PathBuf,
}

impl DeploymentFixture {
    /// Fixture with an executable script containing `body`.
    pub fn with_script(body: &str) -> Self {
        DeploymentFixtureBuilder::new().script(body).build()
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn logs(&self) -> &Path {
        &self.logs
    }

    pub fn tasks(&self) -> &Path {
        &self.tasks
    }

    pub fn request(&self) -> DeployRequest {
        DeployRequest {
            project: self.project.clone(),
            script: self.script.clone(),
            logs: self.logs.clone(),
        }
    }

    /// Default config with task files kept inside the fixture.
    pub fn config(&self) -> DeployerConfig {
        DeployerConfig::default().with_task_dir(&self.tasks)
    }

    pub fn task(&self) -> DeploymentTask {
        DeploymentTask::new(&self.project, &self.script, &self.logs)
    }

    pub fn active_log(&self) -> PathBuf {
        self.logs.join(ACTIVE_LOG_NAME)
    }

    pub fn read_active_log(&self) -> String {
        fs::read_to_string(self.active_log()).expect("active log should exist")
    }

    pub fn rotated_logs(&self) -> Vec<PathBuf> {
        rotated_logs(&self.logs, ACTIVE_LOG_NAME).expect("listing rotated logs")
    }

    /// Content of the single rotated log; panics if there is not exactly one.
    pub fn read_only_rotated_log(&self) -> String {
        let rotated = self.rotated_logs();
        assert_eq!(rotated.len(), 1, "expected one rotated log, got {rotated:?}");
        fs::read_to_string(&rotated[0]).expect("reading rotated log")
    }

    pub fn task_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.tasks)
            .expect("reading task dir")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TASK_FILE_PREFIX))
            })
            .collect();
        files.sort();
        files
    }
}

/// Builder for [`DeploymentFixture`].
pub struct DeploymentFixtureBuilder {
    script: String,
    executable: bool,
}

impl DeploymentFixtureBuilder {
    pub fn new() -> Self {
        Self {
            script: "#!/usr/bin/env bash\nexit 0\n".to_string(),
            executable: true,
        }
    }

    pub fn script(mut self, body: &str) -> Self {
        self.script = body.to_string();
        self
    }

    /// Leave the script without any execute bit.
    pub fn executable(mut self, val: bool) -> Self {
        self.executable = val;
        self
    }

    pub fn build(self) -> DeploymentFixture {
        let root = tempfile::tempdir().expect("creating fixture root");
        let project = root.path().join("project");
        let logs = root.path().join("logs");
        let tasks = root.path().join("tasks");
        for dir in [&project, &logs, &tasks] {
            fs::create_dir_all(dir).expect("creating fixture dir");
        }

        let script = project.join("deploy.sh");
        fs::write(&script, &self.script).expect("writing script");
        set_mode(&script, if self.executable { 0o755 } else { 0o644 });

        DeploymentFixture {
            root,
            project,
            script,
            logs,
            tasks,
        }
    }
}

impl Default for DeploymentFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("setting script mode");
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}
