// crates/core/src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::types::JobId;

/// Errors a progress store read can surface.
///
/// Absence of a record is deliberately NOT in this enum: a missing job is a
/// first-class `Ok(None)` outcome of [`crate::store::ProgressStore::read`],
/// never conflated with zero progress or with a failure of the medium.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage medium itself could not be read. Transient by default:
    /// the pollers keep retrying unless a consecutive-failure cap is set.
    #[error("progress store unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data was read but is not a valid record. Fatal to the waiting
    /// caller, since a corrupt write will not self-heal under retry.
    #[error("malformed progress record for job {job}: {message}")]
    Malformed { job: JobId, message: String },
}

impl StoreError {
    /// Classify an I/O failure from the record path. `NotFound` is not an
    /// error at this layer, so callers must branch on it before reaching
    /// here; everything else means the medium is unreadable.
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(job: &JobId, message: impl Into<String>) -> Self {
        Self::Malformed {
            job: job.clone(),
            message: message.into(),
        }
    }

    /// True for failures the pollers retry through by default.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_display_names_the_path() {
        let err = StoreError::unavailable(
            "/var/progress/abc.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        );
        assert!(err.to_string().contains("/var/progress/abc.json"));
        assert!(err.is_transient());
    }

    #[test]
    fn malformed_display_names_the_job() {
        let err = StoreError::malformed(&JobId::new("abc123"), "progress out of range: 150");
        assert!(err.to_string().contains("abc123"));
        assert!(err.to_string().contains("150"));
        assert!(!err.is_transient());
    }
}
