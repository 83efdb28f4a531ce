// crates/core/src/lib.rs
//! Core library for jobwatch: observe the progress record of a background
//! job owned by an external producer, and notify waiting observers.
//!
//! Two observer paths share one polling primitive:
//! - [`watch::await_completion`] blocks until the terminal record exists and
//!   resolves exactly once (the render-blocking path).
//! - [`stream::ProgressStream`] feeds every observed progress value to a
//!   live subscriber until the terminal value, in order (the live path).
//!
//! The record itself is read-only from this side; [`store::ProgressStore`]
//! is the only place I/O happens, so everything above it stays
//! storage-agnostic.

pub mod config;
pub mod error;
pub mod poll;
pub mod store;
pub mod stream;
pub mod types;
pub mod watch;

#[cfg(test)]
mod testutil;

pub use config::{WatchConfig, DEFAULT_STREAM_INTERVAL};
pub use error::StoreError;
pub use poll::{PollOutcome, Poller, PollerHandle, Tick};
pub use store::{FileProgressStore, ProgressStore};
pub use stream::ProgressStream;
pub use types::{JobId, JobOutput, ProgressRecord, TERMINAL_PROGRESS};
pub use watch::await_completion;
