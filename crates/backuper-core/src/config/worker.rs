//! Backup worker configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Clock cron schedules are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleTimeZone {
    /// The host's local time zone.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
}

/// Settings shared by every job runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Leave each run's workspace on disk instead of removing it when the run ends.
    #[serde(default)]
    pub keep_workspace: bool,
    /// Skip a trigger while a previous run of the same job is still in flight.
    #[serde(default)]
    pub prevent_overlap: bool,
    /// Directory under which run workspaces are created. Defaults to the system temp dir.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    /// Time zone job schedules fire in.
    #[serde(default)]
    pub schedule_timezone: ScheduleTimeZone,
}

impl WorkerConfig {
    /// Resolved workspace root.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
