//! Backup job definitions loaded from the YAML jobs file.

use std::collections::HashSet;
use std::path::Path;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// One scheduled backup job.
///
/// Immutable after loading; every run of the job shares it read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Unique job name, used in workspace names and object keys.
    pub name: String,
    /// Cron expression (five or six fields).
    pub schedule: String,
    /// Shell lines run as a single script. May contain placeholders.
    #[serde(default)]
    pub script: Vec<String>,
    /// Path of the file the script produces. May contain placeholders.
    #[serde(rename = "filepath_to_upload")]
    pub output_path: String,
}

/// Root of the jobs file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Jobs in file order.
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

impl JobsConfig {
    /// Load and validate the jobs file at `path`.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading backup jobs from '{}'", path.display());

        let jobs: Self = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read jobs file '{}': {e}",
                    path.display()
                ))
            })?
            .try_deserialize()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to parse jobs file '{}': {e}",
                    path.display()
                ))
            })?;

        jobs.validate()?;
        Ok(jobs)
    }

    /// Parse and validate jobs from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        let jobs: Self = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        jobs.validate()?;
        Ok(jobs)
    }

    /// Reject files that cannot be scheduled.
    pub fn validate(&self) -> AppResult<()> {
        if self.jobs.is_empty() {
            return Err(AppError::validation("Jobs file defines no jobs"));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.name.trim().is_empty() {
                return Err(AppError::validation("Job name must not be empty"));
            }
            if !seen.insert(job.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate job name '{}'",
                    job.name
                )));
            }
            if job.schedule.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Job '{}' has no schedule",
                    job.name
                )));
            }
            if job.output_path.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Job '{}' has no filepath_to_upload",
                    job.name
                )));
            }
        }

        Ok(())
    }
}
