// src/config/mod.rs

//! Configuration for deployer.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn a raw model into a validated [`DeployerConfig`] (`validate.rs`).
//!
//! Every setting has a default, so running without a config file is the
//! common case.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{DeployerConfig, DeployerSection, RawConfigFile};
