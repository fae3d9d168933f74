#![allow(dead_code)]

pub use deployer_test_utils::{init_tracing, with_timeout};

use std::path::Path;

/// Run the background worker for `task_file` with the real filesystem.
pub async fn run_worker(
    task_file: &Path,
    config: &deployer::config::DeployerConfig,
) -> deployer::errors::Result<()> {
    deployer::exec::run_from_task_file(
        task_file,
        config,
        std::sync::Arc::new(deployer::fs::RealFileSystem),
    )
    .await
}
