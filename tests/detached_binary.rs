// tests/detached_binary.rs
//
// Drives the real `deployer` binary: the foreground `deploy` must return at
// once while the detached worker finishes the job on its own.
mod common;
use crate::common::init_tracing;

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use deployer_test_utils::DeploymentFixture;

fn deployer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_deployer"))
}

/// Write a config that keeps task files inside the fixture.
fn write_config(fx: &DeploymentFixture) -> std::path::PathBuf {
    let path = fx.root().join("deployer.toml");
    std::fs::write(
        &path,
        format!("[deployer]\ntask_dir = {:?}\n", fx.tasks().display().to_string()),
    )
    .unwrap();
    path
}

fn wait_for(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    done()
}

fn deploy(fx: &DeploymentFixture, config: &Path) -> std::process::Output {
    deployer()
        .arg("--config")
        .arg(config)
        .arg("deploy")
        .arg("--project")
        .arg(fx.project())
        .arg("--deploy-script")
        .arg(fx.script())
        .arg("--log-path")
        .arg(fx.logs())
        .output()
        .expect("running deployer")
}

#[test]
fn deploy_returns_before_the_script_finishes() {
    init_tracing();
    let fx = DeploymentFixture::with_script("sleep 2\necho hello\n");
    let config = write_config(&fx);

    let started = Instant::now();
    let output = deploy(&fx, &config);
    let foreground = started.elapsed();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Deployment started in background for task "),
        "{stdout}"
    );
    // `.output()` waits for the pipes to close; a worker holding them would
    // keep us here for the whole script.
    assert!(foreground < Duration::from_secs(2), "took {foreground:?}");

    let finished = wait_for(Duration::from_secs(15), || {
        fx.task_files().is_empty() && fx.rotated_logs().len() == 1
    });
    assert!(finished, "background worker did not finish");

    let log = fx.read_only_rotated_log();
    assert!(log.contains("[STDOUT] hello"), "{log}");
    assert!(log.contains("[SUCCESS] Deployment completed successfully"), "{log}");

    let task_id = stdout.trim().rsplit(' ').next().unwrap();
    assert!(log.contains(&format!("Task ID: {task_id}")), "{log}");
}

#[test]
fn invalid_input_exits_non_zero_without_spawning() {
    init_tracing();
    let fx = DeploymentFixture::with_script("echo never\n");
    let config = write_config(&fx);

    let output = deployer()
        .arg("--config")
        .arg(&config)
        .arg("deploy")
        .arg("--project")
        .arg("relative/project")
        .arg("--deploy-script")
        .arg(fx.script())
        .arg("--log-path")
        .arg(fx.logs())
        .output()
        .expect("running deployer");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("relative/project"), "{stderr}");
    assert!(stderr.contains("must be absolute"), "{stderr}");

    assert!(fx.task_files().is_empty());
    std::thread::sleep(Duration::from_millis(200));
    assert!(!fx.active_log().exists());
    assert!(fx.rotated_logs().is_empty());
}

#[test]
fn invalid_config_exits_non_zero() {
    init_tracing();
    let fx = DeploymentFixture::with_script("echo never\n");
    let config = fx.root().join("bad.toml");
    std::fs::write(&config, "[deployer]\nshell = \"\"\n").unwrap();

    let output = deploy(&fx, &config);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shell must not be empty"), "{stderr}");
    assert!(fx.task_files().is_empty());
}
