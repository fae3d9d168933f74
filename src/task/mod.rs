// src/task/mod.rs

//! Task records and the task-file handoff between the foreground and the
//! background invocation.
//!
//! - [`record`] defines the immutable [`DeploymentTask`].
//! - [`file`] writes a task to a uniquely named JSON file and lets the
//!   background worker claim (read once, delete once) that file.

pub mod file;
pub mod record;

pub use file::{persist_task, ClaimedTaskFile, TASK_FILE_PREFIX, TASK_FILE_SUFFIX};
pub use record::DeploymentTask;
