//! Errors that end a backup run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use backuper_core::error::AppError;

use crate::runner::RunState;

/// Why the backup script did not complete successfully.
#[derive(Debug, Error)]
pub enum ScriptFailure {
    /// The shell could not be started.
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] io::Error),

    /// Waiting on the shell process failed.
    #[error("failed to wait for script: {0}")]
    Wait(#[source] io::Error),

    /// The script exited with a non-zero status.
    #[error("script exited with status {code}")]
    Exit {
        /// Exit code reported by the shell.
        code: i32,
    },

    /// The script was terminated by a signal.
    #[error("script terminated by signal")]
    Signal,
}

/// Terminal failure of a single backup run.
///
/// Every variant ends the run; none is retried.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run workspace could not be created.
    #[error("error creating workspace under '{}': {source}", root.display())]
    WorkspaceCreation {
        /// Directory the workspace was to be created in.
        root: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The backup script failed to spawn or exited non-zero.
    #[error("error running backup script: {0}")]
    ScriptExecution(#[from] ScriptFailure),

    /// The script succeeded but the declared output file is absent.
    #[error("missing artifact '{}': {source}", path.display())]
    ArtifactMissing {
        /// Resolved output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The output file exists but its content could not be read.
    #[error("error detecting content type of '{}': {source}", path.display())]
    ContentTypeDetection {
        /// Resolved output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The object store rejected the upload.
    #[error("error uploading '{key}' to object storage: {source}")]
    Upload {
        /// Object key that was being written.
        key: String,
        /// Error returned by the object store.
        source: AppError,
    },
}

impl RunError {
    /// Last state the run reached before this error.
    pub fn failed_after(&self) -> RunState {
        match self {
            Self::WorkspaceCreation { .. } => RunState::Created,
            Self::ScriptExecution(_) => RunState::WorkspaceReady,
            Self::ArtifactMissing { .. } | Self::ContentTypeDetection { .. } => {
                RunState::ScriptExecuted
            }
            Self::Upload { .. } => RunState::ArtifactValidated,
        }
    }
}
