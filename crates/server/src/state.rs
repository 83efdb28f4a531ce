// crates/server/src/state.rs
//! Shared application state.

use std::sync::Arc;

use jobwatch_core::{ProgressStore, WatchConfig};

/// State handed to every handler: the record store behind its trait seam,
/// plus the polling cadences.
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub config: WatchConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn ProgressStore>, config: WatchConfig) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}
