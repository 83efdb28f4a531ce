// crates/core/src/watch.rs
//! Single-resolution completion path: block until a job's record reaches the
//! terminal value, then hand the terminal record to the caller exactly once.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::config::WatchConfig;
use crate::error::StoreError;
use crate::poll::{PollOutcome, Poller, Tick};
use crate::store::ProgressStore;
use crate::types::{JobId, ProgressRecord};

/// Wait for `job` to finish and return its terminal record.
///
/// One immediate read runs before any timer exists: a job that is already
/// done resolves on the spot and never starts a poller. Otherwise the store
/// is polled at `config.completion_interval`; a missing record and an
/// unreadable medium both mean "not ready yet" and are retried (the latter
/// up to `config.unavailable_cap` consecutive times, when set), while a
/// malformed record rejects immediately.
///
/// Cancellation is dropping the returned future; an axum handler does this
/// for free when the client aborts the request. The internal poller stops
/// with it on every exit path; an abandoned wait never leaks the timer.
pub async fn await_completion(
    store: Arc<dyn ProgressStore>,
    job: &JobId,
    config: &WatchConfig,
) -> Result<ProgressRecord, StoreError> {
    let cap = config.unavailable_cap;
    let mut initial_failures = 0u32;

    match store.read(job).await {
        Ok(Some(record)) if record.is_terminal() => return Ok(record),
        Ok(_) => {}
        Err(e) if e.is_transient() => {
            initial_failures = 1;
            if cap.is_some_and(|c| initial_failures >= c) {
                return Err(e);
            }
            tracing::debug!(job = %job, error = %e, "store unreadable, will retry");
        }
        Err(e) => return Err(e),
    }

    let failures = Arc::new(AtomicU32::new(initial_failures));
    let handle = Poller::spawn(config.completion_interval, {
        let job = job.clone();
        move || {
            let store = store.clone();
            let job = job.clone();
            let failures = failures.clone();
            async move {
                match store.read(&job).await {
                    Ok(Some(record)) if record.is_terminal() => Ok(Tick::Done(record)),
                    Ok(Some(record)) => {
                        failures.store(0, Ordering::SeqCst);
                        tracing::trace!(job = %job, progress = record.progress, "not done yet");
                        Ok(Tick::Continue)
                    }
                    Ok(None) => {
                        failures.store(0, Ordering::SeqCst);
                        tracing::trace!(job = %job, "no record yet");
                        Ok(Tick::Continue)
                    }
                    Err(e) if e.is_transient() => {
                        let n = failures.fetch_add(1, Ordering::SeqCst) + 1;
                        if cap.is_some_and(|c| n >= c) {
                            return Err(e);
                        }
                        tracing::debug!(job = %job, error = %e, "store unreadable, will retry");
                        Ok(Tick::Continue)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    });

    match handle.outcome().await {
        PollOutcome::Done(record) => Ok(record),
        PollOutcome::Failed(e) => Err(e),
        // Nobody holds a stop handle here, so this only fires during
        // runtime teardown while this future is being dropped too.
        PollOutcome::Stopped => std::future::pending().await,
    }
}
