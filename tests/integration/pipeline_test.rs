//! End-to-end tests for backup runs against an in-memory object store.

use std::collections::{HashMap, HashSet};

use backuper_core::config::BackuperConfig;
use backuper_worker::{Environment, OutputStream, RunError, RunState};

use crate::helpers::{self, TestPipeline};

#[tokio::test]
async fn test_backup_uploads_script_output() {
    let pipeline = TestPipeline::new(
        "db",
        &["echo hi > ${TEMP_DIR}/out.txt"],
        "${TEMP_DIR}/out.txt",
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    let objects = pipeline.store.objects();
    assert_eq!(objects.len(), 1);

    let object = &objects[0];
    assert_eq!(object.bucket, "backups");
    assert_eq!(object.content_type, "text/plain; charset=utf-8");
    assert_eq!(object.body, b"hi\n");

    let (timestamp, rest) = object.key.split_once("-db-").unwrap();
    assert!(helpers::is_timestamp(timestamp), "{}", object.key);
    let id = rest.strip_suffix(".txt").unwrap();
    assert!(helpers::is_run_id(id), "{}", object.key);
    assert_eq!(id, report.run_id.as_str());

    assert_eq!(pipeline.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_binary_artifact_keeps_last_extension() {
    let pipeline = TestPipeline::new(
        "pg",
        &["printf '\\037\\213\\010\\000\\000\\000\\000\\000' > ${TEMP_DIR}/dump.sql.gz"],
        "${TEMP_DIR}/dump.sql.gz",
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    let object = &pipeline.store.objects()[0];
    assert_eq!(object.content_type, "application/gzip");
    assert!(object.key.ends_with(".gz"));
    assert!(!object.key.ends_with(".sql.gz"));
}

#[tokio::test]
async fn test_output_without_extension() {
    let pipeline = TestPipeline::new(
        "raw",
        &["echo data > ${TEMP_DIR}/dump"],
        "${TEMP_DIR}/dump",
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    let key = &pipeline.store.objects()[0].key;
    assert!(key.ends_with(&format!("-raw-{}", report.run_id)), "{key}");
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let pipeline = TestPipeline::new(
        "db",
        &[
            "echo \"run ${BACKUP_ID}\"",
            "echo ${BACKUP_ID} > ${TEMP_DIR}/id.txt",
        ],
        "${TEMP_DIR}/id.txt",
    );

    let (first, second) = tokio::join!(pipeline.runner.run(), pipeline.runner.run());

    assert!(first.is_success(), "{:?}", first.error);
    assert!(second.is_success(), "{:?}", second.error);
    assert_ne!(first.run_id, second.run_id);
    assert_ne!(first.workspace, second.workspace);

    for report in [&first, &second] {
        let id = report.run_id.as_str();
        let lines = pipeline.sink.lines_for(id);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line, format!("run {id}"));
        assert_eq!(lines[0].job_name, "db");
        assert_eq!(lines[0].stream, OutputStream::Stdout);
    }

    let bodies: HashMap<String, Vec<u8>> = pipeline
        .store
        .objects()
        .into_iter()
        .map(|o| (o.key, o.body))
        .collect();
    assert_eq!(bodies.len(), 2);
    for report in [&first, &second] {
        let key = report.object_key.as_ref().unwrap();
        assert_eq!(bodies[key], format!("{}\n", report.run_id).into_bytes());
    }
}

#[tokio::test]
async fn test_unknown_placeholder_is_left_verbatim() {
    let pipeline = TestPipeline::new(
        "db",
        &["echo '${DOES_NOT_EXIST}' > ${TEMP_DIR}/out.txt"],
        "${TEMP_DIR}/out.txt",
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(pipeline.store.objects()[0].body, b"${DOES_NOT_EXIST}\n");
}

#[tokio::test]
async fn test_environment_placeholders_are_substituted() {
    let env: Environment = [("DB_NAME", "orders")].into_iter().collect();
    let pipeline = TestPipeline::with_environment(
        "db",
        &["echo ${DB_NAME} > ${TEMP_DIR}/${DB_NAME}.txt"],
        "${TEMP_DIR}/${DB_NAME}.txt",
        env,
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(pipeline.store.objects()[0].body, b"orders\n");
}

#[tokio::test]
async fn test_stderr_is_captured_separately() {
    let pipeline = TestPipeline::new(
        "db",
        &[
            "echo progress",
            "echo warning >&2",
            "echo ok > ${TEMP_DIR}/out.txt",
        ],
        "${TEMP_DIR}/out.txt",
    );

    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    let lines = pipeline.sink.lines();
    let streams: HashSet<(OutputStream, String)> =
        lines.into_iter().map(|l| (l.stream, l.line)).collect();
    assert!(streams.contains(&(OutputStream::Stdout, "progress".to_string())));
    assert!(streams.contains(&(OutputStream::Stderr, "warning".to_string())));
}

#[tokio::test]
async fn test_failing_script_is_not_uploaded() {
    let pipeline = TestPipeline::new(
        "db",
        &["echo hi > ${TEMP_DIR}/out.txt", "exit 3"],
        "${TEMP_DIR}/out.txt",
    );

    let report = pipeline.runner.run().await;

    assert_eq!(report.state, RunState::Failed);
    assert!(matches!(report.error, Some(RunError::ScriptExecution(_))));
    assert!(pipeline.store.objects().is_empty());
    assert_eq!(pipeline.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_missing_artifact_is_not_uploaded() {
    let pipeline = TestPipeline::new("db", &["true"], "${TEMP_DIR}/never-written.txt");

    let report = pipeline.runner.run().await;

    assert_eq!(report.state, RunState::Failed);
    assert!(matches!(
        report.error,
        Some(RunError::ArtifactMissing { .. })
    ));
    assert!(pipeline.store.objects().is_empty());
    assert_eq!(pipeline.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_jobs_file_drives_runs() {
    let dir = tempfile::tempdir().unwrap();
    let jobs_path = dir.path().join("jobs.yaml");
    std::fs::write(
        &jobs_path,
        r#"
jobs:
  - name: configs
    schedule: "*/5 * * * *"
    script:
      - echo "name=${BACKUP_NAME}" > ${TEMP_DIR}/configs.txt
    filepath_to_upload: ${TEMP_DIR}/configs.txt
"#,
    )
    .unwrap();

    let vars: HashMap<String, String> = [
        ("S3_ENDPOINT", "localhost:9000"),
        ("S3_REGION", "us-east-1"),
        ("S3_BUCKET", "backups"),
        ("S3_ACCESS_KEY", "access"),
        ("S3_SECRET_KEY", "secret"),
        ("CONFIG_PATH", jobs_path.to_str().unwrap()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let config = BackuperConfig::from_env_map(vars).unwrap();
    let jobs = config.load_jobs().unwrap();
    assert_eq!(jobs.jobs.len(), 1);

    let job = jobs.jobs.into_iter().next().unwrap();
    let pipeline = TestPipeline::from_job(job, Environment::default());
    let report = pipeline.runner.run().await;

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(pipeline.store.objects()[0].body, b"name=configs\n");
}
