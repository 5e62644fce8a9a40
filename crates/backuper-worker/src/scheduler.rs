//! Cron scheduler that fires job runners on their schedules.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{Local, Utc};
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use backuper_core::config::worker::ScheduleTimeZone;
use backuper_core::error::AppError;
use backuper_core::result::AppResult;

use crate::runner::JobRunner;

/// Triggers registered job runners on their cron schedules.
///
/// Each trigger runs in its own task, so runs of different jobs (and, unless
/// overlap prevention is on, of the same job) proceed concurrently.
pub struct BackupScheduler {
    scheduler: JobScheduler,
    time_zone: ScheduleTimeZone,
}

impl std::fmt::Debug for BackupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupScheduler")
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

impl BackupScheduler {
    /// Create an empty scheduler whose schedules fire in `time_zone`.
    pub async fn new(time_zone: ScheduleTimeZone) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            time_zone,
        })
    }

    /// Time zone schedules are evaluated in.
    pub fn time_zone(&self) -> ScheduleTimeZone {
        self.time_zone
    }

    /// Register `runner` to run on its job's schedule.
    pub async fn register(&self, runner: Arc<JobRunner>) -> AppResult<()> {
        let name = runner.job().name.clone();
        let schedule = runner.job().schedule.clone();
        let expression = normalize_schedule(&schedule);

        tracing::info!(
            name = %name,
            schedule = %schedule,
            time_zone = ?self.time_zone,
            "creating backup command"
        );

        let job = match self.time_zone {
            ScheduleTimeZone::Local => {
                CronJob::new_async_tz(expression.as_str(), Local, move |_uuid, _lock| {
                    fire(Arc::clone(&runner))
                })
            }
            ScheduleTimeZone::Utc => {
                CronJob::new_async_tz(expression.as_str(), Utc, move |_uuid, _lock| {
                    fire(Arc::clone(&runner))
                })
            }
        }
        .map_err(|e| {
            AppError::scheduler(format!(
                "Invalid schedule '{schedule}' for backup '{name}': {e}"
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::scheduler(format!("Failed to register backup '{name}': {e}"))
        })?;

        Ok(())
    }

    /// Start firing registered jobs.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("starting scheduler");
        Ok(())
    }

    /// Stop firing jobs. Runs already in flight are not awaited.
    pub async fn shutdown(&self) -> AppResult<()> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to shut down scheduler: {e}")))?;

        tracing::info!("Scheduler shut down");
        Ok(())
    }
}

fn fire(runner: Arc<JobRunner>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        runner.run().await;
    })
}

/// Accept classic five-field cron expressions by adding a zero seconds field.
pub fn normalize_schedule(schedule: &str) -> String {
    let schedule = schedule.trim();
    if schedule.split_whitespace().count() == 5 {
        format!("0 {schedule}")
    } else {
        schedule.to_string()
    }
}
