//! Core trait definitions.
//!
//! Implementations live in the crates that own the concern
//! (`backuper-storage` for object stores).

pub mod object_store;

pub use object_store::ObjectStore;
