//! Integration tests for the backup pipeline.

mod helpers;
mod pipeline_test;
