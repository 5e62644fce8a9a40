//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// S3-compatible object storage configuration.
///
/// Read from environment variables prefixed with `S3_`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// Endpoint host (`minio.local:9000`) or full URL (`https://s3.example.com`).
    pub endpoint: String,
    /// Region used for request signing and bucket creation.
    pub region: String,
    /// Destination bucket for every backup.
    pub bucket: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Create the bucket at startup when it does not exist.
    #[serde(default)]
    pub auto_create_bucket: bool,
    /// Use HTTPS when the endpoint carries no scheme.
    #[serde(default = "default_true")]
    pub secure: bool,
    /// Address buckets by path instead of virtual host (required by MinIO).
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

impl ObjectStorageConfig {
    /// Endpoint as a full URL, adding a scheme when the configured value has none.
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if self.secure {
            format!("https://{endpoint}")
        } else {
            format!("http://{endpoint}")
        }
    }
}

fn default_true() -> bool {
    true
}
