// crates/core/src/poll.rs
//! Cancellable repeating-check primitive.
//!
//! Both observer paths (the completion future and the progress stream) are
//! built on this one abstraction instead of scattering ambient timers per
//! call site, so the no-overlap and cleanup invariants live in one place.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Outcome of one check invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum Tick<T> {
    /// Nothing conclusive; check again at the next interval.
    Continue,
    /// Terminal value observed; the poller surfaces it once and stops.
    Done(T),
}

/// Final outcome of a poller, observed through [`PollerHandle::outcome`].
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome<T, E> {
    /// The check reported `Tick::Done`.
    Done(T),
    /// The check returned an error. The poller does not interpret errors;
    /// whatever the check let through was fatal by the caller's own policy.
    Failed(E),
    /// Stopped from outside before the check concluded. Not an error.
    Stopped,
}

/// Repeating-timer poller. All state lives in the spawned task; this type
/// only groups the constructor.
pub struct Poller;

impl Poller {
    /// Spawn `check` on a fixed cadence until it concludes or the handle
    /// stops it.
    ///
    /// Invariants held for every caller:
    /// - at most one check is in flight; a tick that fires mid-check is
    ///   skipped, never queued
    /// - after `Done` or an error the check never runs again
    /// - dropping the handle stops the task on the spot, mid-check included
    ///
    /// The first check runs immediately, then every `period`. `period` must
    /// be non-zero.
    pub fn spawn<T, E, F, Fut>(period: Duration, mut check: F) -> PollerHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Tick<T>, E>> + Send + 'static,
    {
        assert!(!period.is_zero(), "poll period must be non-zero");

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (outcome_tx, outcome_rx) = oneshot::channel::<Result<T, E>>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let outcome = loop {
                tokio::select! {
                    // `biased` makes a pending stop win over a due tick, so
                    // "no reads after stop" holds even when both fire on the
                    // same instant.
                    biased;
                    // Resolves on explicit stop and on handle drop alike.
                    _ = &mut stop_rx => return,
                    result = async { ticker.tick().await; check().await } => {
                        match result {
                            Ok(Tick::Continue) => {}
                            Ok(Tick::Done(value)) => break Ok(value),
                            Err(e) => break Err(e),
                        }
                    }
                }
            };

            // The receiving side may already be gone; that just means nobody
            // is waiting for the outcome anymore.
            let _ = outcome_tx.send(outcome);
        });

        PollerHandle {
            stop_tx: Some(stop_tx),
            outcome_rx,
            task,
        }
    }
}

/// Handle to a spawned poller. Dropping it cancels the poll loop.
pub struct PollerHandle<T, E> {
    stop_tx: Option<oneshot::Sender<()>>,
    outcome_rx: oneshot::Receiver<Result<T, E>>,
    task: JoinHandle<()>,
}

impl<T, E> PollerHandle<T, E> {
    /// Stop polling. Idempotent, and safe to call after the poller already
    /// stopped itself on `Done`.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // Send fails when the task already exited; nothing to stop then.
            let _ = tx.send(());
        }
    }

    /// True once the polling task has exited and its timer is released.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the poller to conclude.
    ///
    /// Dropping this future stops the poller: the handle travels inside it,
    /// so abandoning the wait cannot leak the timer task.
    pub async fn outcome(mut self) -> PollOutcome<T, E> {
        match (&mut self.outcome_rx).await {
            Ok(Ok(value)) => PollOutcome::Done(value),
            Ok(Err(e)) => PollOutcome::Failed(e),
            // Sender dropped without a value: the task was stopped (or
            // tore down) before concluding.
            Err(_) => PollOutcome::Stopped,
        }
    }

    /// Poll-style variant of [`outcome`](Self::outcome) for hand-written
    /// `Stream` impls. Must not be polled again after it returns `Ready`.
    pub(crate) fn poll_outcome(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<PollOutcome<T, E>> {
        std::pin::Pin::new(&mut self.outcome_rx)
            .poll(cx)
            .map(|result| match result {
                Ok(Ok(value)) => PollOutcome::Done(value),
                Ok(Err(e)) => PollOutcome::Failed(e),
                Err(_) => PollOutcome::Stopped,
            })
    }
}
