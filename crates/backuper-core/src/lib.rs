//! # backuper-core
//!
//! Core crate for Simple Backuper. Contains the configuration schemas,
//! the object-store trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other backuper crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
