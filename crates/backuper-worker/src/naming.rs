//! Object key naming.

use chrono::{DateTime, Utc};

/// Timestamp layout at the start of every object key. Sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Build `<timestamp>-<job>-<run><ext>` for an uploaded backup.
pub fn object_key(
    timestamp: DateTime<Utc>,
    job_name: &str,
    run_id: &str,
    output_path: &str,
) -> String {
    format!(
        "{}-{}-{}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        job_name,
        run_id,
        file_extension(output_path)
    )
}

/// Extension of the last path component, from its last `.` inclusive.
///
/// `dump.tar.gz` yields `.gz`, `.env` yields `.env`, and `Makefile` yields "".
pub fn file_extension(path: &str) -> &str {
    let name_start = path.rfind(std::path::is_separator).map_or(0, |i| i + 1);
    let name = &path[name_start..];
    name.rfind('.').map_or("", |i| &name[i..])
}
