// src/exec/launcher.rs

//! Foreground half of a deployment: hand the task to a detached copy of
//! this executable and return.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::cli::LogLevel;
use crate::config::DeployerConfig;
use crate::errors::{DeployerError, Result};
use crate::fs::FileSystem;
use crate::task::{persist_task, DeploymentTask};
use crate::types::TaskId;
use crate::validate::validate_paths;

/// Paths supplied by the caller of `deploy`.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub project: PathBuf,
    pub script: PathBuf,
    pub logs: PathBuf,
}

/// Trait abstracting how the background worker is started.
///
/// Production code uses [`SelfRespawner`]; tests can record the task file
/// instead of spawning a real process.
pub trait BackgroundSpawner {
    /// Start a background worker for `task_file` without waiting for it.
    fn spawn_worker(&self, task_file: &Path) -> Result<()>;
}

/// Re-invokes the current executable as `internal-run --task-file <path>`.
///
/// On Unix the child gets its own session, so job-control signals aimed at
/// the caller's process group (Ctrl-C, SIGHUP on terminal close) do not
/// reach it. Its standard streams go to the null device so the caller is
/// never held open by inherited pipes.
#[derive(Debug, Clone)]
pub struct SelfRespawner {
    executable: PathBuf,
    config_path: Option<PathBuf>,
    log_level: Option<LogLevel>,
}

impl SelfRespawner {
    /// Resolve the running executable.
    pub fn current(config_path: Option<PathBuf>, log_level: Option<LogLevel>) -> Result<Self> {
        let executable = std::env::current_exe().map_err(|e| {
            DeployerError::Spawn(format!("failed to resolve current executable: {e}"))
        })?;
        Ok(Self::with_executable(executable, config_path, log_level))
    }

    pub fn with_executable(
        executable: impl Into<PathBuf>,
        config_path: Option<PathBuf>,
        log_level: Option<LogLevel>,
    ) -> Self {
        Self {
            executable: executable.into(),
            config_path,
            log_level,
        }
    }

    fn command(&self, task_file: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        if let Some(level) = self.log_level {
            cmd.arg("--log-level").arg(level.as_str());
        }
        if let Some(config) = &self.config_path {
            cmd.arg("--config").arg(config);
        }
        cmd.arg("internal-run").arg("--task-file").arg(task_file);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // SAFETY: `setsid` is async-signal-safe and touches no memory of
            // the parent.
            unsafe {
                cmd.pre_exec(|| {
                    if libc::setsid() == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        cmd
    }
}

impl BackgroundSpawner for SelfRespawner {
    fn spawn_worker(&self, task_file: &Path) -> Result<()> {
        let child = self.command(task_file).spawn().map_err(|e| {
            DeployerError::Spawn(format!(
                "failed to start background process {:?}: {e}",
                self.executable
            ))
        })?;

        // Not waited on: the worker outlives this process and is reparented
        // once we exit.
        debug!(pid = child.id(), task_file = ?task_file, "background worker started");
        Ok(())
    }
}

/// Validate `request`, persist it as a task file and start a background
/// worker for it.
///
/// Every error returned here is reported to the caller synchronously. On a
/// spawn failure the task file is removed again, since no worker will ever
/// claim it.
pub fn launch(
    request: &DeployRequest,
    config: &DeployerConfig,
    fs: &dyn FileSystem,
    spawner: &dyn BackgroundSpawner,
) -> Result<TaskId> {
    validate_paths(fs, &request.project, &request.script, &request.logs)?;

    let task = DeploymentTask::new(&request.project, &request.script, &request.logs);
    let task_file = persist_task(&task, config.task_dir())?;

    if let Err(err) = spawner.spawn_worker(&task_file) {
        if let Err(e) = fs.remove_file(&task_file) {
            warn!(path = ?task_file, error = %e, "failed to remove orphaned task file");
        }
        return Err(err);
    }

    info!(
        task_id = %task.task_id(),
        task_file = ?task_file,
        "deployment handed to background worker"
    );
    Ok(task.task_id().clone())
}
