// crates/core/src/store.rs
//! Read-only access to producer-owned progress records.
//!
//! The record is the single source of truth for a job and the core never
//! mutates it. Each read is a point-in-time snapshot with no ordering
//! guarantee beyond "later calls may return different data": the producer
//! overwrites the record in place, unsynchronized with our reads.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{JobId, ProgressRecord};

/// Storage-agnostic accessor for a job's progress record.
///
/// `Ok(None)` means no record exists for the job ("job not found"), distinct
/// from both zero progress and a read failure. Implementations must not
/// error for a missing job.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn read(&self, job: &JobId) -> Result<Option<ProgressRecord>, StoreError>;
}

/// File-backed store: one JSON document per job at `<dir>/<job>.json`,
/// overwritten in place by the external producer.
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve the record path for a job, refusing ids whose name would
    /// escape the store directory (separators, `..`, empty).
    fn record_path(&self, job: &JobId) -> Option<PathBuf> {
        let name = job.as_str();
        if name.is_empty() {
            return None;
        }
        let candidate = Path::new(name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return None,
        }
        Some(self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    async fn read(&self, job: &JobId) -> Result<Option<ProgressRecord>, StoreError> {
        // An id that names no possible record behaves like a job that was
        // never started.
        let Some(path) = self.record_path(job) else {
            tracing::warn!(job = %job, "refusing job id that escapes the store directory");
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::unavailable(path, e)),
        };

        let record: ProgressRecord = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::malformed(job, e.to_string()))?;
        record
            .validate()
            .map_err(|v| StoreError::malformed(job, format!("progress out of range: {v}")))?;

        Ok(Some(record))
    }
}
