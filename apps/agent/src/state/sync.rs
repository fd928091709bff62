//! # Sync State
//!
//! Holds the process-wide sync coordinator.
//!
//! The coordinator owns the run guard that serializes `sync_now`, so there
//! must be exactly one of it per process; commands share it through this
//! state type.

use std::sync::Arc;

use depot_sync::SyncCoordinator;

/// Wrapper around the shared `SyncCoordinator`.
#[derive(Clone)]
pub struct SyncState {
    coordinator: Arc<SyncCoordinator>,
}

impl SyncState {
    /// Creates a new SyncState.
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        SyncState { coordinator }
    }

    /// Returns the shared coordinator.
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }
}
