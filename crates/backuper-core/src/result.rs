//! Convenience result type alias for Simple Backuper.

use crate::error::AppError;

/// A specialized `Result` type for backuper operations.
pub type AppResult<T> = Result<T, AppError>;
