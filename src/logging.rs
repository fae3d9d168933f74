// src/logging.rs

//! Diagnostics for the deployer process itself, on stderr.
//!
//! Not to be confused with the deployment log: that file is what operators
//! read. The foreground `deploy` command prints diagnostics to the caller's
//! terminal. The detached worker inherits a null stderr, so its diagnostics
//! are discarded unless it is started by hand with `internal-run`; anything
//! an operator must see after the spawn goes into the deployment log instead.
//!
//! The filter is `--log-level` when given (the launcher forwards it to the
//! worker), otherwise the `DEPLOYER_LOG` directives (e.g. `deployer=debug`),
//! otherwise `info`.

use std::io::{self, IsTerminal};

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV: &str = "DEPLOYER_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

/// Unparseable or blank directives fall back to `info`.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_str());
    }
    env.map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn cli_level_wins_over_environment() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn environment_directives_are_used_when_valid() {
        let filter = build_filter(None, Some(" debug "));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn bad_or_missing_environment_falls_back_to_info() {
        for env in [None, Some(""), Some("deployer=loud")] {
            let filter = build_filter(None, env);
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO), "{env:?}");
        }
    }
}
