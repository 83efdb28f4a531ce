// crates/core/src/testutil.rs
//! Scripted store for timing tests: replays a fixed sequence of read
//! outcomes, repeating the final step once the script runs out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::ProgressStore;
use crate::types::{JobId, JobOutput, ProgressRecord};

/// One scripted read outcome.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// No record for the job.
    Missing,
    /// A live record at the given progress value.
    Progress(u8),
    /// The terminal record, carrying an output reference.
    Finished(&'static str),
    /// The medium is unreadable.
    Unavailable,
    /// The record parses to garbage.
    Malformed,
}

pub struct ScriptedStore {
    steps: Vec<Step>,
    cursor: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        assert!(!steps.is_empty(), "script needs at least one step");
        Arc::new(Self {
            steps,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Total number of reads served so far.
    pub fn reads(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressStore for ScriptedStore {
    async fn read(&self, job: &JobId) -> Result<Option<ProgressRecord>, StoreError> {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        let step = self.steps[i.min(self.steps.len() - 1)];
        match step {
            Step::Missing => Ok(None),
            Step::Progress(value) => Ok(Some(ProgressRecord {
                progress: value,
                result: None,
            })),
            Step::Finished(img) => Ok(Some(ProgressRecord {
                progress: crate::types::TERMINAL_PROGRESS,
                result: Some(JobOutput {
                    img: img.to_string(),
                }),
            })),
            Step::Unavailable => Err(StoreError::unavailable(
                "scripted",
                std::io::Error::new(std::io::ErrorKind::Other, "scripted outage"),
            )),
            Step::Malformed => Err(StoreError::malformed(job, "scripted garbage")),
        }
    }
}
