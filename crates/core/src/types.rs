// crates/core/src/types.rs
//! Domain types for job progress observation.
//!
//! The producer owns exactly one record per job and overwrites it in place
//! until it carries the terminal value. Everything here is read-side: these
//! types are parsed from producer-written data, never written back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sole terminal progress value. No transition happens past it.
pub const TERMINAL_PROGRESS: u8 = 100;

/// Opaque identifier naming one background job's progress record.
///
/// The core does no parsing beyond treating it as a string; it exists as a
/// newtype so job ids don't get mixed up with other strings at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Reference to the artifact a finished job produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Path or URL of the rendered image.
    pub img: String,
}

/// Producer-owned state for one job: progress in `0..=100` plus the result
/// reference once the job is done.
///
/// Parsed data is not trusted as-is: [`ProgressRecord::validate`] runs on
/// every store read, so values past the terminal bound never reach the
/// polling components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Completion percentage. 100 is terminal.
    pub progress: u8,

    /// Produced output, present once the job finishes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
}

impl ProgressRecord {
    /// True once the job has reached the state from which no further
    /// transition occurs.
    pub fn is_terminal(&self) -> bool {
        self.progress == TERMINAL_PROGRESS
    }

    /// Range check for producer-written data. Returns the offending value so
    /// the store can fold it into its malformed-record error.
    pub fn validate(&self) -> Result<(), u8> {
        if self.progress > TERMINAL_PROGRESS {
            return Err(self.progress);
        }
        Ok(())
    }
}
