// crates/core/src/stream.rs
//! Live observation path: an ordered, finite sequence of progress values
//! for one subscriber.
//!
//! Every subscription runs its own poller against the store, so concurrent
//! observers of the same job are fully independent and a dropped
//! subscription takes nothing down but itself.

use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::config::WatchConfig;
use crate::error::StoreError;
use crate::poll::{PollOutcome, Poller, PollerHandle, Tick};
use crate::store::ProgressStore;
use crate::types::JobId;

/// Per-emission buffer. One value arrives per poll tick at most, so this
/// only matters when the consumer stalls, and then the poller blocks on
/// send and skips ticks rather than queueing stale values.
const CHANNEL_CAPACITY: usize = 32;

/// Ordered feed of a job's progress values.
///
/// Emits every successfully read value (consecutive duplicates included;
/// deduplication would buy little and cost latency on the terminal value),
/// ends after yielding 100, and yields a single `Err` before ending if the
/// record is malformed or the store stays unreadable past the configured
/// cap. A subscription is not restartable; open a new one for a fresh
/// sequence.
///
/// Dropping the stream stops the poller: no further reads, no further
/// emissions, timer released.
pub struct ProgressStream {
    rx: mpsc::Receiver<Result<u8, StoreError>>,
    handle: PollerHandle<(), StoreError>,
    finished: bool,
}

impl ProgressStream {
    /// Subscribe to `job`, polling at `config.stream_interval`.
    pub fn open(store: Arc<dyn ProgressStore>, job: JobId, config: &WatchConfig) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let cap = config.unavailable_cap;
        let failures = Arc::new(AtomicU32::new(0));

        let handle = Poller::spawn(config.stream_interval, move || {
            let store = store.clone();
            let job = job.clone();
            let tx = tx.clone();
            let failures = failures.clone();
            async move {
                let record = match store.read(&job).await {
                    Ok(Some(record)) => {
                        failures.store(0, Ordering::SeqCst);
                        record
                    }
                    Ok(None) => {
                        failures.store(0, Ordering::SeqCst);
                        tracing::trace!(job = %job, "no record yet");
                        return Ok(Tick::Continue);
                    }
                    Err(e) if e.is_transient() => {
                        let n = failures.fetch_add(1, Ordering::SeqCst) + 1;
                        if cap.is_some_and(|c| n >= c) {
                            return Err(e);
                        }
                        tracing::debug!(job = %job, error = %e, "store unreadable, will retry");
                        return Ok(Tick::Continue);
                    }
                    Err(e) => return Err(e),
                };

                let terminal = record.is_terminal();
                if tx.send(Ok(record.progress)).await.is_err() {
                    // Consumer hung up mid-teardown; stop without an outcome.
                    return Ok(Tick::Done(()));
                }
                if terminal {
                    Ok(Tick::Done(()))
                } else {
                    Ok(Tick::Continue)
                }
            }
        });

        Self {
            rx,
            handle,
            finished: false,
        }
    }
}

impl Stream for ProgressStream {
    type Item = Result<u8, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                // Channel drained and the poll task is gone; one look at the
                // outcome tells us whether it ended fatally. The oneshot is
                // already resolved at this point, and `finished` guards it
                // from ever being polled again.
                this.finished = true;
                match this.handle.poll_outcome(cx) {
                    Poll::Ready(PollOutcome::Failed(e)) => Poll::Ready(Some(Err(e))),
                    Poll::Ready(PollOutcome::Done(())) | Poll::Ready(PollOutcome::Stopped) => {
                        Poll::Ready(None)
                    }
                    // Unreachable in practice (sender side is gone), but
                    // ending the stream beats wedging the consumer.
                    Poll::Pending => Poll::Ready(None),
                }
            }
        }
    }
}
