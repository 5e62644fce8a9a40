//! Per-run temporary workspaces.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use tempfile::TempDir;

use backuper_core::config::worker::WorkerConfig;

use crate::error::RunError;
use crate::id::RunId;

/// Creates run workspaces under a root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    /// Directory workspaces are created in.
    root: PathBuf,
    /// Leave workspaces on disk after the run.
    keep: bool,
}

impl WorkspaceManager {
    /// Create a manager rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            root: root.into(),
            keep,
        }
    }

    /// Create a manager from worker settings.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.workspace_root(), config.keep_workspace)
    }

    /// Create the workspace `backup-<job>-<run>-<random>` for one run.
    pub fn create(&self, job_name: &str, run_id: &RunId) -> Result<Workspace, RunError> {
        let creation_error = |source| RunError::WorkspaceCreation {
            root: self.root.clone(),
            source,
        };

        let root = std::path::absolute(&self.root).map_err(creation_error)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("backup-{job_name}-{run_id}-"))
            .disable_cleanup(self.keep)
            .tempdir_in(&root)
            .map_err(creation_error)?;

        let path = dir
            .path()
            .to_string_lossy()
            .trim_end_matches(MAIN_SEPARATOR)
            .to_string();

        tracing::debug!(workspace = %path, "Workspace created");
        Ok(Workspace {
            dir,
            path,
            keep: self.keep,
        })
    }
}

/// Scratch directory owned by one run.
///
/// Dropping the workspace removes the directory unless it was created with
/// retention enabled; [`Workspace::release`] does the same and logs the outcome.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    path: String,
    keep: bool,
}

impl Workspace {
    /// Absolute path without a trailing separator.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The workspace directory.
    pub fn as_path(&self) -> &Path {
        self.dir.path()
    }

    /// End the run's use of the workspace.
    pub fn release(self) {
        let Self { dir, path, keep } = self;
        if keep {
            tracing::info!(workspace = %path, "Workspace retained");
            drop(dir);
            return;
        }

        match dir.close() {
            Ok(()) => tracing::debug!(workspace = %path, "Workspace removed"),
            Err(e) => tracing::warn!(workspace = %path, error = %e, "Failed to remove workspace"),
        }
    }
}
