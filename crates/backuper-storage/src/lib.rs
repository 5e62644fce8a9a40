//! # backuper-storage
//!
//! Object storage provider implementations for Simple Backuper, plus the
//! startup bucket check.

pub mod bucket;
pub mod providers;

pub use bucket::ensure_bucket;
#[cfg(feature = "s3")]
pub use providers::S3ObjectStore;
