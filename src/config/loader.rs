// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{DeployerConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<DeployerConfig> {
    let raw_config = load_from_path(&path)?;
    let config = DeployerConfig::try_from(raw_config)?;
    debug!(path = ?path.as_ref(), ?config, "configuration loaded");
    Ok(config)
}

/// Load `path` if given, otherwise fall back to built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<DeployerConfig> {
    match path {
        Some(p) => load_and_validate(p),
        None => Ok(DeployerConfig::default()),
    }
}
