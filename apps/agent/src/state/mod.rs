//! # State Module
//!
//! Manages application state for the agent process.
//!
//! ## Why Multiple State Types?
//! Instead of a single `AppState` struct containing everything,
//! we use separate state types. This approach:
//!
//! 1. **Better Separation of Concerns**: each state type has a single responsibility
//! 2. **Easier Testing**: can construct individual states over an in-memory store
//! 3. **Clearer Command Signatures**: commands declare exactly what state they need
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐      │
//! │  │   DbState    │  │  SyncState   │  │   ConfigState            │      │
//! │  │              │  │              │  │                          │      │
//! │  │  Database    │  │  Arc<Sync    │  │  device_id               │      │
//! │  │  (SQLite     │  │  Coordinator>│  │  data_dir                │      │
//! │  │   pool)      │  │              │  │  offline flag            │      │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────┘      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has an internal connection pool (thread-safe)     │
//! │  • SyncState: the coordinator's run guard serializes sync_now          │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod sync;

pub use config::ConfigState;
pub use db::DbState;
pub use sync::SyncState;
