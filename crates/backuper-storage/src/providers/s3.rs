//! S3-compatible object store provider (AWS S3, MinIO, Ceph RGW, ...).

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

use backuper_core::config::storage::ObjectStorageConfig;
use backuper_core::error::AppError;
use backuper_core::result::AppResult;
use backuper_core::traits::ObjectStore;

/// Region that rejects an explicit location constraint on bucket creation.
const DEFAULT_REGION: &str = "us-east-1";

/// S3-compatible object store.
///
/// The wrapped [`Client`] is cheap to clone and safe to share between tasks.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a client with static credentials against the configured endpoint.
    pub async fn new(config: &ObjectStorageConfig) -> AppResult<Self> {
        let endpoint = config.endpoint_url();
        tracing::info!(
            endpoint = %endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 object store"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "backuper-static",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn bucket_exists(&self, bucket: &str) -> AppResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || err
                        .raw_response()
                        .is_some_and(|r| r.status().as_u16() == 404);
                if not_found {
                    Ok(false)
                } else {
                    Err(AppError::storage(format!(
                        "Failed to check bucket '{bucket}': {}",
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> AppResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(|err| {
            AppError::storage(format!(
                "Failed to create bucket '{bucket}': {}",
                DisplayErrorContext(&err)
            ))
        })?;

        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        content_type: &str,
    ) -> AppResult<()> {
        let body = ByteStream::from_path(source).await.map_err(|err| {
            AppError::storage(format!(
                "Failed to open '{}' for upload: {}",
                source.display(),
                DisplayErrorContext(&err)
            ))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                AppError::storage(format!(
                    "Failed to upload s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&err)
                ))
            })?;

        tracing::debug!(bucket, key, content_type, "Object uploaded");
        Ok(())
    }
}
