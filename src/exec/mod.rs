// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] is the foreground half: validate, persist a task file and
//!   re-spawn this executable in the background through a
//!   [`BackgroundSpawner`].
//! - [`worker`] is the background half: claim the task file, run the
//!   deployment, finalize and rotate the log, delete the task file.
//! - [`runner`] executes the deployment script itself and streams its
//!   output into the deployment log.

pub mod launcher;
pub mod runner;
pub mod worker;

pub use launcher::{launch, BackgroundSpawner, DeployRequest, SelfRespawner};
pub use runner::{run_deployment, ENV_LOG_PATH, ENV_PROJECT_PATH, ENV_TASK_ID};
pub use worker::run_from_task_file;
