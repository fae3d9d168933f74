// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod log;
pub mod logging;
pub mod task;
pub mod types;
pub mod validate;

use std::sync::Arc;

use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::load_or_default;
use crate::errors::Result;
use crate::exec::{launch, run_from_task_file, DeployRequest, SelfRespawner};
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// - `deploy`: validate, write the task file, spawn the detached worker,
///   print the task id. Every failure here is returned to the caller.
/// - `internal-run`: execute one task file in this process. Its outcome is
///   recorded in the deployment log; the returned error only reaches the
///   diagnostics log.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = load_or_default(args.config.as_deref())?;
    debug!(?config, "effective configuration");

    match args.command {
        Command::Deploy {
            project,
            deploy_script,
            log_path,
        } => {
            let request = DeployRequest {
                project,
                script: deploy_script,
                logs: log_path,
            };
            let spawner = SelfRespawner::current(args.config.clone(), args.log_level)?;
            let task_id = launch(&request, &config, &RealFileSystem, &spawner)?;
            println!("Deployment started in background for task {task_id}");
            Ok(())
        }
        Command::InternalRun { task_file } => {
            run_from_task_file(&task_file, &config, Arc::new(RealFileSystem)).await
        }
    }
}
