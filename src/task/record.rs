// src/task/record.rs

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TaskId;

/// One request to run a deployment script against a project.
///
/// Serialized as JSON with camelCase keys (`projectPath`, `scriptPath`,
/// `logPath`, `taskId`, `createdAt`). Fields are private; a task never
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTask {
    project_path: PathBuf,
    script_path: PathBuf,
    log_path: PathBuf,
    task_id: TaskId,
    created_at: DateTime<Utc>,
}

impl DeploymentTask {
    /// Create a task stamped with the current time.
    ///
    /// Paths are expected to have been checked by
    /// [`crate::validate::validate_paths`] already.
    pub fn new(
        project_path: impl Into<PathBuf>,
        script_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self::with_creation_time(project_path, script_path, log_path, Utc::now())
    }

    pub fn with_creation_time(
        project_path: impl Into<PathBuf>,
        script_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            script_path: script_path.into(),
            log_path: log_path.into(),
            task_id: TaskId::from_time(at),
            created_at: at,
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Directory holding the active and rotated deployment logs.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_camel_case_keys() {
        let at = Utc.timestamp_opt(1_700_000_000, 5).unwrap();
        let task = DeploymentTask::with_creation_time(
            "/srv/app",
            "/srv/app/deploy.sh",
            "/var/log/app",
            at,
        );

        let json: serde_json::Value = serde_json::to_value(&task).unwrap();
        assert_eq!(json["projectPath"], "/srv/app");
        assert_eq!(json["scriptPath"], "/srv/app/deploy.sh");
        assert_eq!(json["logPath"], "/var/log/app");
        assert_eq!(json["taskId"], "1700000000000000005");
        assert!(json["createdAt"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn parses_a_task_file_body() {
        let body = r#"{
            "projectPath": "/srv/app",
            "scriptPath": "/srv/app/deploy.sh",
            "logPath": "/var/log/app",
            "taskId": "42",
            "createdAt": "2024-01-02T03:04:05Z"
        }"#;

        let task: DeploymentTask = serde_json::from_str(body).unwrap();
        assert_eq!(task.task_id().as_str(), "42");
        assert_eq!(task.log_path(), Path::new("/var/log/app"));
        assert_eq!(
            task.creation_time(),
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }
}
