//! Output file validation and content-type detection.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use crate::error::RunError;

/// Number of leading bytes inspected to classify a file.
pub const SNIFF_LEN: usize = 8 * 1024;

/// Content type of an empty file.
pub const EMPTY_CONTENT_TYPE: &str = "text/plain";
/// Content type of readable text without a recognised signature.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// Fallback content type for unrecognised binary data.
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// An output file confirmed to exist, with its detected content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArtifact {
    path: PathBuf,
    content_type: String,
}

impl ValidatedArtifact {
    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected MIME type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Everything needed to upload one backup.
///
/// Only obtainable from a [`ValidatedArtifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArtifact {
    source: PathBuf,
    content_type: String,
    key: String,
    bucket: String,
}

impl UploadArtifact {
    /// Target `artifact` at `key` in `bucket`.
    pub fn new(artifact: ValidatedArtifact, key: String, bucket: String) -> Self {
        Self {
            source: artifact.path,
            content_type: artifact.content_type,
            key,
            bucket,
        }
    }

    /// File to upload.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// MIME type stored with the object.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Destination bucket.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Confirm the script's output file exists and classify its content.
pub async fn validate(path: &Path) -> Result<ValidatedArtifact, RunError> {
    tokio::fs::metadata(path)
        .await
        .map_err(|source| RunError::ArtifactMissing {
            path: path.to_path_buf(),
            source,
        })?;

    let content_type =
        detect_content_type(path)
            .await
            .map_err(|source| RunError::ContentTypeDetection {
                path: path.to_path_buf(),
                source,
            })?;

    Ok(ValidatedArtifact {
        path: path.to_path_buf(),
        content_type,
    })
}

/// Read the head of `path` and classify it.
pub async fn detect_content_type(path: &Path) -> io::Result<String> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    Ok(classify(&head))
}

/// Classify leading file bytes as a MIME type.
pub fn classify(head: &[u8]) -> String {
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if head.is_empty() {
        return EMPTY_CONTENT_TYPE.to_string();
    }
    if looks_like_text(head) {
        TEXT_CONTENT_TYPE.to_string()
    } else {
        BINARY_CONTENT_TYPE.to_string()
    }
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte character cut off at the sniff boundary.
        Err(e) => e.error_len().is_none(),
    }
}
