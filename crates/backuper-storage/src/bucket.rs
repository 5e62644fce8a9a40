//! Startup check for the destination bucket.

use backuper_core::config::storage::ObjectStorageConfig;
use backuper_core::error::AppError;
use backuper_core::result::AppResult;
use backuper_core::traits::ObjectStore;

/// Make sure the configured bucket exists before any job is scheduled.
///
/// A missing bucket is created when `auto_create_bucket` is set and is a
/// startup error otherwise.
pub async fn ensure_bucket(store: &dyn ObjectStore, config: &ObjectStorageConfig) -> AppResult<()> {
    if store.bucket_exists(&config.bucket).await? {
        tracing::info!(bucket = %config.bucket, "Bucket exists");
        return Ok(());
    }

    tracing::warn!(bucket = %config.bucket, "Bucket does not exist");
    if !config.auto_create_bucket {
        return Err(AppError::not_found(format!(
            "Bucket '{}' does not exist and S3_AUTO_CREATE_BUCKET is disabled",
            config.bucket
        )));
    }

    store.create_bucket(&config.bucket, &config.region).await?;
    tracing::info!(bucket = %config.bucket, region = %config.region, "Bucket created");
    Ok(())
}
