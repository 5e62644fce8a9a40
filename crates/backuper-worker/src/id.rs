//! Run identifiers.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use backuper_core::error::AppError;

/// Characters a run identifier is drawn from.
pub const RUN_ID_ALPHABET: &[u8; 36] = b"1234567890abcdefghijklmnopqrstuvwxyz";

/// Length of a run identifier.
pub const RUN_ID_LEN: usize = 8;

/// Short random identifier of one backup run.
///
/// Appears in workspace names, object keys, and every log record of the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh identifier from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id = (0..RUN_ID_LEN)
            .map(|_| RUN_ID_ALPHABET[rng.gen_range(0..RUN_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RUN_ID_LEN || !s.bytes().all(|b| RUN_ID_ALPHABET.contains(&b)) {
            return Err(AppError::validation(format!("Invalid run id '{s}'")));
        }
        Ok(Self(s.to_string()))
    }
}

/// Who a piece of script output belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// Run identifier.
    pub id: RunId,
    /// Name of the job being run.
    pub job_name: String,
}

impl RunIdentity {
    /// Create a run identity.
    pub fn new(id: RunId, job_name: impl Into<String>) -> Self {
        Self {
            id,
            job_name: job_name.into(),
        }
    }
}
