// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::log::ACTIVE_LOG_NAME;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [deployer]
/// task_dir = "/var/lib/deployer/tasks"
/// shell = "bash"
/// log_file_name = "deployment.log"
/// lock_log_dir = true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub deployer: DeployerSection,
}

/// `[deployer]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployerSection {
    /// Directory receiving task files. `None` means the system temp dir.
    #[serde(default)]
    pub task_dir: Option<PathBuf>,

    /// Interpreter used to run deployment scripts (`<shell> <script>`).
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Name of the active log inside each log directory.
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,

    /// Serialize tasks that share a log directory.
    #[serde(default = "default_lock_log_dir")]
    pub lock_log_dir: bool,
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_log_file_name() -> String {
    ACTIVE_LOG_NAME.to_string()
}

fn default_lock_log_dir() -> bool {
    true
}

impl Default for DeployerSection {
    fn default() -> Self {
        Self {
            task_dir: None,
            shell: default_shell(),
            log_file_name: default_log_file_name(),
            lock_log_dir: default_lock_log_dir(),
        }
    }
}

/// Validated configuration. Construct through `TryFrom<RawConfigFile>` or
/// [`DeployerConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployerConfig {
    task_dir: PathBuf,
    shell: String,
    log_file_name: String,
    lock_log_dir: bool,
}

impl DeployerConfig {
    pub(crate) fn new_unchecked(
        task_dir: PathBuf,
        shell: String,
        log_file_name: String,
        lock_log_dir: bool,
    ) -> Self {
        Self {
            task_dir,
            shell,
            log_file_name,
            lock_log_dir,
        }
    }

    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn log_file_name(&self) -> &str {
        &self.log_file_name
    }

    pub fn lock_log_dir(&self) -> bool {
        self.lock_log_dir
    }

    /// Same configuration with task files written to `dir`.
    pub fn with_task_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.task_dir = dir.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_log_file_name(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = name.into();
        self
    }
}

impl Default for DeployerConfig {
    fn default() -> Self {
        let section = DeployerSection::default();
        Self::new_unchecked(
            std::env::temp_dir(),
            section.shell,
            section.log_file_name,
            section.lock_log_dir,
        )
    }
}
