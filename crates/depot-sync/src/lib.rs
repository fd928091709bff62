//! # depot-sync: Sync Coordinator for Depot
//!
//! Reconciles the local store with the remote system of record, driven by
//! the change-capture outbox in depot-db.
//!
//! ## How Sync Fits Together
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Domain mutation ──► change_log row (same transaction, depot-db)       │
//! │                                                                         │
//! │  SyncCoordinator::sync_now()                                           │
//! │       │                                                                 │
//! │       ├── snapshot pending pool (FIFO)                                 │
//! │       ├── RemoteBackend::push(batch)   ◄── trait seam; the wire        │
//! │       │                                    protocol is external        │
//! │       ├── mark each record synced / failed                             │
//! │       └── record the run in sync_log                                   │
//! │                                                                         │
//! │  SyncCoordinator::status()    ──► pending / synced / failed counts     │
//! │  SyncCoordinator::clear_error ──► manual retry for exhausted records   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`] - The sync coordinator itself
//! - [`backend`] - `RemoteBackend` trait + the simulated stand-in
//! - [`policy`] - Retry ceiling and batch size as configuration
//! - [`config`] - TOML + environment configuration loading
//! - [`error`] - Sync error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod policy;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{PushFailure, PushReport, RemoteBackend, SimulatedBackend};
pub use config::{DeviceConfig, RemoteConfig, SyncConfig};
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use policy::SyncPolicy;
