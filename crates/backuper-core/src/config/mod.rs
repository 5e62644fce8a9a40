//! Application configuration schemas.
//!
//! Everything except the jobs file comes from the environment and is
//! deserialized through the `config` crate. Each sub-module represents a
//! logical configuration section.

pub mod jobs;
pub mod logging;
pub mod storage;
pub mod worker;

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use self::jobs::JobsConfig;
use self::logging::LoggingConfig;
use self::storage::ObjectStorageConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Environment variable naming the YAML jobs file.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackuperConfig {
    /// Object storage settings (`S3_*`).
    pub storage: ObjectStorageConfig,
    /// Path of the YAML jobs file (`CONFIG_PATH`).
    pub config_path: PathBuf,
    /// Logging settings (`BACKUPER_LOGGING__*`).
    pub logging: LoggingConfig,
    /// Job runner settings (`BACKUPER_WORKER__*`).
    pub worker: WorkerConfig,
}

/// Sections read from variables prefixed with `BACKUPER_`.
#[derive(Debug, Default, Deserialize)]
struct RuntimeSections {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    worker: WorkerConfig,
}

impl BackuperConfig {
    /// Load configuration from the process environment.
    pub fn load() -> AppResult<Self> {
        Self::from_env_map(std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map.
    pub fn from_env_map(vars: HashMap<String, String>) -> AppResult<Self> {
        let source: config::Map<String, String> = vars.into_iter().collect();

        let storage: ObjectStorageConfig = Config::builder()
            .add_source(
                Environment::with_prefix("S3").source(Some(source.clone())),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to read S3 settings: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Invalid S3 settings: {e}")))?;

        let runtime: RuntimeSections = Config::builder()
            .add_source(
                Environment::with_prefix("BACKUPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(source.clone())),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        let config_path = source
            .get(CONFIG_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AppError::configuration(format!("{CONFIG_PATH_VAR} is required")))?;

        Ok(Self {
            storage,
            config_path,
            logging: runtime.logging,
            worker: runtime.worker,
        })
    }

    /// Load the jobs file this configuration points at.
    pub fn load_jobs(&self) -> AppResult<JobsConfig> {
        JobsConfig::load(&self.config_path)
    }
}
