// crates/core/src/config.rs
//! Polling configuration shared by the completion and stream paths.

use std::time::Duration;

/// Default cadence for the live progress stream.
pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_millis(200);

/// Cadences and hardening knobs for the two observer paths.
///
/// The completion cadence has no default on purpose: an implicit
/// as-fast-as-possible tick is easy to ship by accident, so callers say
/// what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Cadence of the completion path.
    pub completion_interval: Duration,

    /// Cadence of the live stream path.
    pub stream_interval: Duration,

    /// When set, `Unavailable` stops being transient after this many
    /// consecutive unreadable polls and escalates to the waiting caller.
    /// `None` retries forever, the baseline behavior.
    pub unavailable_cap: Option<u32>,
}

impl WatchConfig {
    /// Build a config with the mandatory completion cadence. Both intervals
    /// must be non-zero.
    pub fn new(completion_interval: Duration) -> Self {
        assert!(
            !completion_interval.is_zero(),
            "completion poll interval must be non-zero"
        );
        Self {
            completion_interval,
            stream_interval: DEFAULT_STREAM_INTERVAL,
            unavailable_cap: None,
        }
    }

    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        assert!(!interval.is_zero(), "stream poll interval must be non-zero");
        self.stream_interval = interval;
        self
    }

    pub fn with_unavailable_cap(mut self, cap: u32) -> Self {
        self.unavailable_cap = Some(cap);
        self
    }
}
