// src/config/validate.rs

use std::path::Path;

use crate::config::model::{DeployerConfig, RawConfigFile};
use crate::errors::{DeployerError, Result};

impl TryFrom<RawConfigFile> for DeployerConfig {
    type Error = DeployerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let section = raw.deployer;
        Ok(DeployerConfig::new_unchecked(
            section.task_dir.unwrap_or_else(std::env::temp_dir),
            section.shell,
            section.log_file_name,
            section.lock_log_dir,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_task_dir(cfg)?;
    validate_shell(cfg)?;
    validate_log_file_name(cfg)?;
    Ok(())
}

fn validate_task_dir(cfg: &RawConfigFile) -> Result<()> {
    if let Some(dir) = &cfg.deployer.task_dir {
        if !dir.is_absolute() {
            return Err(DeployerError::ConfigError(format!(
                "[deployer].task_dir must be absolute (got {:?})",
                dir
            )));
        }
    }
    Ok(())
}

fn validate_shell(cfg: &RawConfigFile) -> Result<()> {
    if cfg.deployer.shell.trim().is_empty() {
        return Err(DeployerError::ConfigError(
            "[deployer].shell must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_log_file_name(cfg: &RawConfigFile) -> Result<()> {
    let name = &cfg.deployer.log_file_name;
    let bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name.as_str());
    if !bare {
        return Err(DeployerError::ConfigError(format!(
            "[deployer].log_file_name must be a plain file name (got {name:?})"
        )));
    }
    if !name.ends_with(".log") || name.len() <= ".log".len() {
        return Err(DeployerError::ConfigError(format!(
            "[deployer].log_file_name must end in \".log\" (got {name:?})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::DeployerSection;

    fn raw(section: DeployerSection) -> RawConfigFile {
        RawConfigFile { deployer: section }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = DeployerConfig::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg, DeployerConfig::default());
        assert_eq!(cfg.shell(), "bash");
        assert_eq!(cfg.log_file_name(), "deployment.log");
        assert!(cfg.lock_log_dir());
    }

    #[test]
    fn relative_task_dir_is_rejected() {
        let err = DeployerConfig::try_from(raw(DeployerSection {
            task_dir: Some("tasks".into()),
            ..DeployerSection::default()
        }))
        .unwrap_err();
        assert!(err.to_string().contains("task_dir must be absolute"));
    }

    #[test]
    fn log_file_name_must_be_bare_and_end_in_log() {
        for bad in ["logs/deployment.log", "deployment.txt", ".log", "", ".."] {
            let result = DeployerConfig::try_from(raw(DeployerSection {
                log_file_name: bad.to_string(),
                ..DeployerSection::default()
            }));
            assert!(
                matches!(result, Err(DeployerError::ConfigError(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn blank_shell_is_rejected() {
        let result = DeployerConfig::try_from(raw(DeployerSection {
            shell: "  ".to_string(),
            ..DeployerSection::default()
        }));
        assert!(matches!(result, Err(DeployerError::ConfigError(_))));
    }
}
