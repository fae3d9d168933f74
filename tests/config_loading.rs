// tests/config_loading.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use deployer::config::{load_and_validate, load_or_default, DeployerConfig};
use deployer::errors::DeployerError;

fn config_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[test]
fn full_config_is_parsed() {
    let file = config_file(
        r#"
[deployer]
task_dir = "/var/lib/deployer/tasks"
shell = "/bin/bash"
log_file_name = "release.log"
lock_log_dir = false
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.task_dir(), Path::new("/var/lib/deployer/tasks"));
    assert_eq!(cfg.shell(), "/bin/bash");
    assert_eq!(cfg.log_file_name(), "release.log");
    assert!(!cfg.lock_log_dir());
}

#[test]
fn empty_file_means_defaults() {
    let file = config_file("");
    assert_eq!(load_and_validate(file.path()).unwrap(), DeployerConfig::default());
    assert_eq!(load_or_default(None).unwrap(), DeployerConfig::default());
}

#[test]
fn unknown_keys_are_rejected() {
    let file = config_file("[deployer]\nqueue_dir = \"/tmp/q\"\n");

    match load_and_validate(file.path()) {
        Err(DeployerError::TomlError(e)) => assert!(e.to_string().contains("queue_dir")),
        other => panic!("expected TOML error, got {other:?}"),
    }
}

#[test]
fn semantic_errors_are_config_errors() {
    let file = config_file("[deployer]\ntask_dir = \"relative/tasks\"\n");

    match load_and_validate(file.path()) {
        Err(DeployerError::ConfigError(msg)) => assert!(msg.contains("task_dir")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_or_default(Some(dir.path().join("nope.toml").as_path()));
    assert!(matches!(result, Err(DeployerError::IoError(_))));
}
