// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `deployer`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deployer",
    version,
    about = "Run a deployment script in the background with durable logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional config file (TOML). Defaults apply when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPLOYER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the paths, queue the deployment and return immediately.
    Deploy {
        /// Absolute path to the project directory.
        #[arg(long, value_name = "PATH")]
        project: PathBuf,

        /// Absolute path to the deployment script.
        #[arg(long, alias = "deployScript", value_name = "PATH")]
        deploy_script: PathBuf,

        /// Absolute path to the directory where logs will be stored.
        #[arg(long, alias = "logPath", value_name = "PATH")]
        log_path: PathBuf,
    },

    /// Run a queued task file. Started by `deploy`; not meant for humans.
    #[command(hide = true)]
    InternalRun {
        #[arg(long, value_name = "PATH")]
        task_file: PathBuf,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Spelling accepted by `--log-level`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_accepts_legacy_flag_spellings() {
        let args = CliArgs::try_parse_from([
            "deployer",
            "deploy",
            "--project=/srv/app",
            "--deployScript=/srv/app/deploy.sh",
            "--logPath=/var/log/app",
        ])
        .unwrap();

        match args.command {
            Command::Deploy {
                project,
                deploy_script,
                log_path,
            } => {
                assert_eq!(project, PathBuf::from("/srv/app"));
                assert_eq!(deploy_script, PathBuf::from("/srv/app/deploy.sh"));
                assert_eq!(log_path, PathBuf::from("/var/log/app"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn internal_run_takes_global_flags_first() {
        let args = CliArgs::try_parse_from([
            "deployer",
            "--log-level",
            "debug",
            "--config",
            "/etc/deployer.toml",
            "internal-run",
            "--task-file",
            "/tmp/deploy_task_1.json",
        ])
        .unwrap();

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.config, Some(PathBuf::from("/etc/deployer.toml")));
        assert!(matches!(args.command, Command::InternalRun { .. }));
    }

    #[test]
    fn log_level_spelling_round_trips_through_clap() {
        for level in LogLevel::value_variants() {
            let parsed = LogLevel::from_str(level.as_str(), false).unwrap();
            assert_eq!(parsed, *level);
        }
    }

    #[test]
    fn deploy_requires_all_paths() {
        let result = CliArgs::try_parse_from(["deployer", "deploy", "--project", "/srv/app"]);
        assert!(result.is_err());
    }
}
