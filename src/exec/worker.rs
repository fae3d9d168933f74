// src/exec/worker.rs

//! Background half of a deployment.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::DeployerConfig;
use crate::errors::{DeployerError, Result};
use crate::exec::runner::run_deployment;
use crate::fs::FileSystem;
use crate::log::{rotate_log, DeploymentLog, LogDirLock};
use crate::task::{ClaimedTaskFile, DeploymentTask};

/// Process the task stored in `task_file`, start to finish.
///
/// 1. claim and parse the task file
/// 2. lock the log directory (if enabled)
/// 3. truncate the active log and run the script
/// 4. append the `[SUCCESS]` or `[ERROR]` marker
/// 5. rotate the active log
/// 6. delete the task file
///
/// The task file is deleted whatever the outcome, including when it cannot
/// be parsed. The returned error is the deployment's own failure. A missing
/// lock or a failed rotation never changes it; both are recorded as
/// `[WARNING]` entries in the deployment log, which is the only output of a
/// detached worker anyone reads.
pub async fn run_from_task_file(
    task_file: &Path,
    config: &DeployerConfig,
    fs: Arc<dyn FileSystem>,
) -> Result<()> {
    let claim = ClaimedTaskFile::claim(fs, task_file);
    let task = match claim.read_task() {
        Ok(task) => task,
        Err(e) => {
            error!(task_file = ?task_file, error = %e, "unreadable task file; discarding");
            return Err(e);
        }
    };

    info!(task_id = %task.task_id(), "processing deployment task");

    let mut warnings = Vec::new();
    let lock = if config.lock_log_dir() {
        match lock_log_dir(&task).await {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!(task_id = %task.task_id(), error = %e, "running without log directory lock");
                warnings.push(format!("[WARNING] Running without log directory lock: {e}"));
                None
            }
        }
    } else {
        None
    };

    let outcome = execute_and_record(&task, config, &warnings).await;

    match &outcome {
        Ok(()) => info!(task_id = %task.task_id(), "deployment completed successfully"),
        Err(e) => error!(task_id = %task.task_id(), error = %e, "deployment failed"),
    }

    if let Err(e) = rotate_log(task.log_path(), config.log_file_name()) {
        warn!(task_id = %task.task_id(), error = %e, "failed to rotate log file");
        record_rotation_failure(&task, config, &e).await;
    }

    drop(lock);

    if let Err(e) = claim.remove() {
        warn!(task_id = %task.task_id(), error = %e, "failed to remove task file");
    }

    outcome
}

/// Take the log directory lock, waiting behind any task that holds it.
async fn lock_log_dir(task: &DeploymentTask) -> Result<LogDirLock> {
    if let Some(lock) = LogDirLock::try_acquire(task.log_path())? {
        return Ok(lock);
    }
    info!(task_id = %task.task_id(), "log directory busy; waiting for the running deployment");
    LogDirLock::acquire_async(task.log_path()).await
}

/// Open the active log, run the deployment and append the final marker.
///
/// `warnings` are written right after the log is created. The log handle is
/// closed when this returns, before rotation.
async fn execute_and_record(
    task: &DeploymentTask,
    config: &DeployerConfig,
    warnings: &[String],
) -> Result<()> {
    let log = Arc::new(DeploymentLog::create(task.log_path(), config.log_file_name()).await?);
    for warning in warnings {
        log.write_entry(warning).await?;
    }

    let outcome = run_deployment(task, log.clone(), config.shell()).await;

    let marker = match &outcome {
        Ok(()) => "[SUCCESS] Deployment completed successfully".to_string(),
        Err(e) => format!("[ERROR] Deployment failed: {e}"),
    };
    if let Err(e) = log.write_entry(&marker).await {
        warn!(task_id = %task.task_id(), error = %e, "failed to write final log entry");
    }

    outcome
}

/// A failed rotation leaves the active log in place; note the failure there.
async fn record_rotation_failure(
    task: &DeploymentTask,
    config: &DeployerConfig,
    err: &DeployerError,
) {
    let entry = format!("[WARNING] Failed to rotate log: {err}");
    let written = match DeploymentLog::reopen(task.log_path(), config.log_file_name()).await {
        Ok(log) => log.write_entry(&entry).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        warn!(task_id = %task.task_id(), error = %e, "failed to record rotation failure");
    }
}
