// src/exec/runner.rs

//! Deployment script runner.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DeployerError, Result};
use crate::log::{DeploymentLog, ENTRY_TIME_FORMAT};
use crate::task::DeploymentTask;
use crate::types::OutputStream;

pub const ENV_TASK_ID: &str = "DEPLOYER_TASK_ID";
pub const ENV_PROJECT_PATH: &str = "DEPLOYER_PROJECT_PATH";
pub const ENV_LOG_PATH: &str = "DEPLOYER_LOG_PATH";

/// Run `<shell> <script>` for `task`, streaming its output into `log`.
///
/// Writes the start header, the per-line `[STDOUT]` / `[STDERR]` entries and
/// either the completion footer or an `[ERROR]` entry describing what went
/// wrong. Returns only after the child has exited *and* both output
/// forwarders have drained their pipes.
///
/// Lines of one stream keep their order. The relative order of stdout and
/// stderr lines depends on which pipe delivers first.
pub async fn run_deployment(
    task: &DeploymentTask,
    log: Arc<DeploymentLog>,
    shell: &str,
) -> Result<()> {
    let project = task.project_path();
    let script = task.script_path();

    log.write_entry(&format!("=== Deployment Started: {} ===", now()))
        .await?;
    log.write_entry(&format!("Project Path: {}", project.display()))
        .await?;
    log.write_entry(&format!("Script Path: {}", script.display()))
        .await?;
    log.write_entry(&format!("Task ID: {}", task.task_id()))
        .await?;

    if let Err(reason) = check_project_dir(project).await {
        log.write_entry(&format!("[ERROR] Failed to change directory: {reason}"))
            .await?;
        return Err(DeployerError::ProjectDirectory {
            path: project.to_path_buf(),
            reason,
        });
    }

    let metadata = match tokio::fs::metadata(script).await {
        Ok(m) => m,
        Err(e) => {
            log.write_entry(&format!("[ERROR] Script not found: {e}"))
                .await?;
            return Err(DeployerError::ScriptNotFound {
                path: script.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    if let Err(e) = ensure_executable(script, &metadata).await {
        warn!(task_id = %task.task_id(), error = %e, "could not make script executable");
        log.write_entry(&format!("[WARNING] Failed to make script executable: {e}"))
            .await?;
    }

    info!(
        task_id = %task.task_id(),
        shell,
        script = ?script,
        "starting deployment script"
    );

    let mut cmd = Command::new(shell);
    cmd.arg(script)
        .current_dir(project)
        .env(ENV_TASK_ID, task.task_id().as_str())
        .env(ENV_PROJECT_PATH, project)
        .env(ENV_LOG_PATH, task.log_path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let (entry, err) = classify_spawn_failure(project, script, shell, e).await;
            log.write_entry(&entry).await?;
            return Err(err);
        }
    };

    let stdout = child
        .stdout
        .take()
        .map(|pipe| forward_lines(pipe, OutputStream::Stdout, log.clone()));
    let stderr = child
        .stderr
        .take()
        .map(|pipe| forward_lines(pipe, OutputStream::Stderr, log.clone()));

    let status = child.wait().await;

    // Join the forwarders before judging the outcome so no captured line is
    // written after the footer.
    for (stream, handle) in [
        (OutputStream::Stdout, stdout),
        (OutputStream::Stderr, stderr),
    ] {
        let Some(handle) = handle else {
            continue;
        };
        match handle.await {
            Ok(lines) => debug!(task_id = %task.task_id(), %stream, lines, "stream drained"),
            Err(e) => warn!(
                task_id = %task.task_id(),
                %stream,
                error = %e,
                "stream forwarder failed"
            ),
        }
    }

    let status = match status {
        Ok(status) => status,
        Err(e) => {
            log.write_entry(&format!("[ERROR] Failed to wait for deployment script: {e}"))
                .await?;
            return Err(DeployerError::IoError(e));
        }
    };

    info!(
        task_id = %task.task_id(),
        exit_code = ?status.code(),
        success = status.success(),
        "deployment script exited"
    );

    if !status.success() {
        let err = DeployerError::ScriptExecution {
            code: status.code(),
        };
        log.write_entry(&format!("[ERROR] {err}")).await?;
        return Err(err);
    }

    log.write_entry(&format!("=== Deployment Completed: {} ===", now()))
        .await?;
    Ok(())
}

/// Map a failed spawn to its log entry and error.
///
/// The chdir into the project happens inside spawn, so a project that
/// vanished or became unenterable since the first check is reported as a
/// directory failure rather than a bad interpreter.
async fn classify_spawn_failure(
    project: &Path,
    script: &Path,
    shell: &str,
    e: std::io::Error,
) -> (String, DeployerError) {
    if let Err(reason) = check_project_dir(project).await {
        return (
            format!("[ERROR] Failed to change directory: {reason}"),
            DeployerError::ProjectDirectory {
                path: project.to_path_buf(),
                reason,
            },
        );
    }
    (
        format!("[ERROR] Failed to start deployment script: {e}"),
        DeployerError::ScriptNotFound {
            path: script.to_path_buf(),
            reason: format!("failed to start '{shell}': {e}"),
        },
    )
}

/// The project must be a directory the worker may enter.
async fn check_project_dir(project: &Path) -> std::result::Result<(), String> {
    match tokio::fs::metadata(project).await {
        Ok(m) if m.is_dir() => {}
        Ok(_) => return Err(format!("{} is not a directory", project.display())),
        Err(e) => return Err(format!("{}: {e}", project.display())),
    }
    can_enter(project).map_err(|e| format!("{}: {e}", project.display()))
}

#[cfg(unix)]
fn can_enter(dir: &Path) -> std::io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    if unsafe { libc::access(c_path.as_ptr(), libc::X_OK) } == -1 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn can_enter(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Add owner-execute when the script has no execute bit at all.
#[cfg(unix)]
async fn ensure_executable(script: &Path, metadata: &std::fs::Metadata) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    if mode & 0o111 != 0 {
        return Ok(());
    }
    let permissions = std::fs::Permissions::from_mode(mode | 0o100);
    tokio::fs::set_permissions(script, permissions).await?;
    debug!(script = ?script, "added owner-execute permission");
    Ok(())
}

#[cfg(not(unix))]
async fn ensure_executable(_script: &Path, _metadata: &std::fs::Metadata) -> std::io::Result<()> {
    Ok(())
}

/// Forward every line of `pipe` into the log. Returns the number of lines.
///
/// Lines are decoded lossily. A failed log write is reported but reading
/// continues, so the child never blocks on a full pipe.
fn forward_lines<R>(pipe: R, stream: OutputStream, log: Arc<DeploymentLog>) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        let mut count = 0u64;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(%stream, error = %e, "failed to read script output");
                    break;
                }
            }

            let line = String::from_utf8_lossy(trim_line_ending(&buf));
            if let Err(e) = log.write_stream_line(stream, &line).await {
                warn!(%stream, error = %e, "failed to write script output to log");
            }
            count += 1;
        }

        count
    })
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

fn now() -> String {
    Local::now().format(ENTRY_TIME_FORMAT).to_string()
}
