//! Backup job execution for Simple Backuper.
//!
//! This crate provides:
//! - The job runner that drives one triggered backup through its stages
//! - Placeholder substitution for script lines and output paths
//! - Per-run workspaces, script execution with streamed output, artifact
//!   validation, and object key naming
//! - A cron scheduler that fires job runners on their schedules

pub mod artifact;
pub mod error;
pub mod id;
pub mod naming;
pub mod runner;
pub mod scheduler;
pub mod script;
pub mod template;
pub mod workspace;

pub use error::RunError;
pub use id::{RunId, RunIdentity};
pub use runner::{JobRunner, RunReport, RunState};
pub use scheduler::BackupScheduler;
pub use script::{OutputStream, ScriptExecutor, ScriptOutputSink, TracingSink};
pub use template::Environment;
