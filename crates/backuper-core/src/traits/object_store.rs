//! Object store trait for backup destinations.

use std::path::Path;

use async_trait::async_trait;

use crate::result::AppResult;

/// Destination for uploaded backups.
///
/// One instance is shared by every job runner, so implementations must be
/// usable concurrently without external locking.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "s3").
    fn provider_type(&self) -> &str;

    /// Check whether `bucket` exists.
    async fn bucket_exists(&self, bucket: &str) -> AppResult<bool>;

    /// Create `bucket` in `region`.
    async fn create_bucket(&self, bucket: &str, region: &str) -> AppResult<()>;

    /// Upload the file at `source` to `bucket` under `key`, tagged with `content_type`.
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> AppResult<()>;
}
