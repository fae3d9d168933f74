// src/errors.rs

//! Crate-wide error type.
//!
//! The first three variants are the only failures the foreground `deploy`
//! invocation ever reports. Everything from `ScriptNotFound` downwards is
//! raised inside the background worker and ends up in the deployment log.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Validation error: {path:?}: {reason}")]
    Validation { path: PathBuf, reason: String },

    #[error("Task persistence error: {0}")]
    TaskPersistence(String),

    #[error("Spawn error: {0}")]
    Spawn(String),

    #[error("Deployment script not found: {path:?}: {reason}")]
    ScriptNotFound { path: PathBuf, reason: String },

    #[error("Failed to change to project directory {path:?}: {reason}")]
    ProjectDirectory { path: PathBuf, reason: String },

    #[error("Deployment script exited with non-zero status: {}", describe_status(.code))]
    ScriptExecution { code: Option<i32> },

    #[error("Log rotation error: {0}")]
    LogRotation(String),

    #[error("Log file error: {0}")]
    LogFile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeployerError {
    pub(crate) fn validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DeployerError::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Exit code, or the fact that the process was killed by a signal.
fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeployerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_path_and_reason() {
        let err = DeployerError::validation("/srv/logs", "log path is not writable");
        let msg = err.to_string();
        assert!(msg.contains("/srv/logs"));
        assert!(msg.contains("not writable"));
    }

    #[test]
    fn script_execution_reports_exit_status() {
        let err = DeployerError::ScriptExecution { code: Some(1) };
        assert_eq!(
            err.to_string(),
            "Deployment script exited with non-zero status: exit status 1"
        );

        let err = DeployerError::ScriptExecution { code: None };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
