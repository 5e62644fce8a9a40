//! Job runner: drives one triggered backup through its stages.
//!
//! `Created → WorkspaceReady → ScriptExecuted → ArtifactValidated → Uploaded`,
//! with any stage failure moving straight to `Failed`. Nothing is retried and
//! earlier stages are not undone, except that the workspace is released on
//! every exit path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::Instrument;

use backuper_core::config::jobs::JobDefinition;
use backuper_core::config::worker::WorkerConfig;
use backuper_core::traits::ObjectStore;

use crate::artifact::{self, UploadArtifact};
use crate::error::RunError;
use crate::id::{RunId, RunIdentity};
use crate::naming;
use crate::script::{ScriptExecutor, ScriptOutputSink, TracingSink};
use crate::template::{self, Environment, TemplateContext};
use crate::workspace::{Workspace, WorkspaceManager};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Triggered, nothing done yet.
    Created,
    /// Workspace directory exists.
    WorkspaceReady,
    /// Script exited zero.
    ScriptExecuted,
    /// Output file found and classified.
    ArtifactValidated,
    /// Output file stored in the bucket.
    Uploaded,
    /// A stage failed.
    Failed,
    /// Trigger ignored because a previous run of the job was still in flight.
    Skipped,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::WorkspaceReady => "workspace_ready",
            Self::ScriptExecuted => "script_executed",
            Self::ArtifactValidated => "artifact_validated",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Job name.
    pub job_name: String,
    /// Final state.
    pub state: RunState,
    /// Workspace directory used by the run.
    pub workspace: Option<PathBuf>,
    /// Detected content type of the output file.
    pub content_type: Option<String>,
    /// Key the backup was stored under.
    pub object_key: Option<String>,
    /// Error that ended the run.
    pub error: Option<RunError>,
}

impl RunReport {
    fn new(run_id: RunId, job_name: &str) -> Self {
        Self {
            run_id,
            job_name: job_name.to_string(),
            state: RunState::Created,
            workspace: None,
            content_type: None,
            object_key: None,
            error: None,
        }
    }

    fn advance(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "Run state changed");
        self.state = next;
    }

    fn fail(&mut self, error: RunError) {
        self.state = RunState::Failed;
        self.error = Some(error);
    }

    /// Whether the backup reached the bucket.
    pub fn is_success(&self) -> bool {
        self.state == RunState::Uploaded
    }
}

/// Runs one backup job each time it is triggered.
///
/// Shared between triggers; concurrent runs only share the object store and
/// the output sink.
#[derive(Debug)]
pub struct JobRunner {
    job: Arc<JobDefinition>,
    environment: Arc<Environment>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    workspaces: WorkspaceManager,
    executor: ScriptExecutor,
    /// Held for the duration of a run when overlap prevention is enabled.
    in_flight: Option<Arc<Mutex<()>>>,
}

impl JobRunner {
    /// Create a runner for `job` that uploads to `bucket`.
    pub fn new(
        job: Arc<JobDefinition>,
        environment: Arc<Environment>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            job,
            environment,
            store,
            bucket: bucket.into(),
            workspaces: WorkspaceManager::from_config(config),
            executor: ScriptExecutor::new(Arc::new(TracingSink)),
            in_flight: config
                .prevent_overlap
                .then(|| Arc::new(Mutex::new(()))),
        }
    }

    /// Send script output to `sink` instead of the tracing sink.
    pub fn with_output_sink(mut self, sink: Arc<dyn ScriptOutputSink>) -> Self {
        self.executor = ScriptExecutor::new(sink);
        self
    }

    /// The job this runner executes.
    pub fn job(&self) -> &JobDefinition {
        &self.job
    }

    /// Run the job once with a fresh run identifier.
    pub async fn run(&self) -> RunReport {
        self.run_with_id(RunId::generate()).await
    }

    /// Run the job once under `run_id`.
    pub async fn run_with_id(&self, run_id: RunId) -> RunReport {
        let span = tracing::info_span!("backup", id = %run_id, backup_name = %self.job.name);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(&self, run_id: RunId) -> RunReport {
        let mut report = RunReport::new(run_id, &self.job.name);

        let _in_flight = match &self.in_flight {
            Some(lock) => match Arc::clone(lock).try_lock_owned() {
                Ok(guard) => Some(guard),
                Err(_) => {
                    tracing::warn!("Previous run still in progress, skipping trigger");
                    report.state = RunState::Skipped;
                    return report;
                }
            },
            None => None,
        };

        tracing::info!("backup started");

        match self.drive(&mut report).await {
            Ok(()) => {
                tracing::info!(
                    file = report.object_key.as_deref().unwrap_or_default(),
                    bucket = %self.bucket,
                    "backup uploaded to object storage"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, stage = %err.failed_after(), "backup failed");
                report.fail(err);
            }
        }

        tracing::info!(state = %report.state, "backup finished");
        report
    }

    async fn drive(&self, report: &mut RunReport) -> Result<(), RunError> {
        let workspace = self.workspaces.create(&self.job.name, &report.run_id)?;
        report.workspace = Some(workspace.as_path().to_path_buf());
        report.advance(RunState::WorkspaceReady);

        let outcome = self.run_in_workspace(&workspace, report).await;
        workspace.release();
        outcome
    }

    async fn run_in_workspace(
        &self,
        workspace: &Workspace,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        let context = TemplateContext {
            backup_id: report.run_id.as_str(),
            backup_name: &self.job.name,
            temp_dir: workspace.path(),
        };
        let script: Vec<String> = self
            .job
            .script
            .iter()
            .map(|line| template::substitute(line, &context, &self.environment))
            .collect();
        let output_path = template::substitute(&self.job.output_path, &context, &self.environment);

        let identity = RunIdentity::new(report.run_id.clone(), self.job.name.clone());
        self.executor.execute(&identity, &script).await?;
        report.advance(RunState::ScriptExecuted);

        let validated = artifact::validate(Path::new(&output_path)).await?;
        report.content_type = Some(validated.content_type().to_string());
        report.advance(RunState::ArtifactValidated);

        let key = naming::object_key(
            Utc::now(),
            &self.job.name,
            report.run_id.as_str(),
            &output_path,
        );
        let upload = UploadArtifact::new(validated, key, self.bucket.clone());

        self.store
            .upload_file(
                upload.bucket(),
                upload.key(),
                upload.source(),
                upload.content_type(),
            )
            .await
            .map_err(|source| RunError::Upload {
                key: upload.key().to_string(),
                source,
            })?;

        report.object_key = Some(upload.key().to_string());
        report.advance(RunState::Uploaded);
        Ok(())
    }
}
