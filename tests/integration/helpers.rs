//! Shared test helpers for integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use backuper_core::config::jobs::JobDefinition;
use backuper_core::config::worker::WorkerConfig;
use backuper_core::error::AppError;
use backuper_core::result::AppResult;
use backuper_core::traits::ObjectStore;
use backuper_worker::{Environment, JobRunner, OutputStream, RunIdentity, ScriptOutputSink};

/// An object the store accepted.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// In-memory object store that records every upload.
#[derive(Debug, Default)]
pub struct SpyStore {
    objects: Mutex<Vec<StoredObject>>,
}

impl SpyStore {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for SpyStore {
    fn provider_type(&self) -> &str {
        "spy"
    }

    async fn bucket_exists(&self, _bucket: &str) -> AppResult<bool> {
        Ok(true)
    }

    async fn create_bucket(&self, _bucket: &str, _region: &str) -> AppResult<()> {
        Err(AppError::internal("create_bucket is not expected in these tests"))
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> AppResult<()> {
        let body = tokio::fs::read(source).await?;
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }
}

/// A line of script output together with the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub run_id: String,
    pub job_name: String,
    pub stream: OutputStream,
    pub line: String,
}

/// Output sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<CapturedLine>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<CapturedLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn lines_for(&self, run_id: &str) -> Vec<CapturedLine> {
        self.lines()
            .into_iter()
            .filter(|l| l.run_id == run_id)
            .collect()
    }
}

impl ScriptOutputSink for RecordingSink {
    fn write_line(&self, run: &RunIdentity, stream: OutputStream, line: &str) {
        self.lines.lock().unwrap().push(CapturedLine {
            run_id: run.id.to_string(),
            job_name: run.job_name.clone(),
            stream,
            line: line.to_string(),
        });
    }
}

/// Test harness wiring a job to a spy store and a recording sink.
pub struct TestPipeline {
    pub store: Arc<SpyStore>,
    pub sink: Arc<RecordingSink>,
    pub runner: Arc<JobRunner>,
    /// Holds the workspace root for the duration of the test.
    pub root: tempfile::TempDir,
}

impl TestPipeline {
    pub fn new(name: &str, script: &[&str], output_path: &str) -> Self {
        Self::with_environment(name, script, output_path, Environment::default())
    }

    pub fn with_environment(
        name: &str,
        script: &[&str],
        output_path: &str,
        environment: Environment,
    ) -> Self {
        let job = JobDefinition {
            name: name.to_string(),
            schedule: "0 3 * * *".to_string(),
            script: script.iter().map(|s| s.to_string()).collect(),
            output_path: output_path.to_string(),
        };
        Self::from_job(job, environment)
    }

    pub fn from_job(job: JobDefinition, environment: Environment) -> Self {
        let root = tempfile::tempdir().expect("Failed to create workspace root");
        let store = Arc::new(SpyStore::default());
        let sink = Arc::new(RecordingSink::default());
        let config = WorkerConfig {
            workspace_root: Some(root.path().to_path_buf()),
            ..Default::default()
        };

        let runner = JobRunner::new(
            Arc::new(job),
            Arc::new(environment),
            store.clone(),
            "backups",
            &config,
        )
        .with_output_sink(sink.clone());

        Self {
            store,
            sink,
            runner: Arc::new(runner),
            root,
        }
    }

    /// Number of entries left under the workspace root.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.root.path())
            .expect("Failed to read workspace root")
            .count()
    }
}

/// Whether `ts` looks like `YYYY_MM_DD_HH_MM_SS`.
pub fn is_timestamp(ts: &str) -> bool {
    let parts: Vec<&str> = ts.split('_').collect();
    parts.len() == 6
        && parts[0].len() == 4
        && parts[1..].iter().all(|p| p.len() == 2)
        && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
}

/// Whether `id` is a well-formed run identifier.
pub fn is_run_id(id: &str) -> bool {
    id.len() == 8
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}
