// src/log/mod.rs

//! Deployment log handling.
//!
//! - [`writer`] owns the active log file of one task: truncated once at
//!   the start, then every entry is appended and synced before returning.
//! - [`rotate`] archives the active log under a timestamped name.
//! - [`lock`] serializes tasks that share a log directory.

pub mod lock;
pub mod rotate;
pub mod writer;

pub use lock::LogDirLock;
pub use rotate::{rotate_log, rotated_logs};
pub use writer::DeploymentLog;

/// Default file name of the active log inside a log directory.
pub const ACTIVE_LOG_NAME: &str = "deployment.log";

/// Timestamp format used inside log lines.
pub(crate) const ENTRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used in rotated file names.
pub(crate) const ROTATION_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
