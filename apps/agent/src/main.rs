//! # Depot Agent Entry Point
//!
//! The binary entry point for the Depot agent: the local-first data layer
//! process a warehouse UI talks to.
//!
//! ## Process Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Depot Agent                                    │
//! │                                                                         │
//! │  main.rs ────► Tokio runtime, delegates to lib run()                   │
//! │                                                                         │
//! │  lib.rs ─────► Config, store lifecycle, AppContext, run loop           │
//! │                                                                         │
//! │  commands/ ──► create_item, checkout_item, sync_now, quit, ...         │
//! │                                                                         │
//! │  state/ ─────► DbState, SyncState, ConfigState                         │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  depot.db (local file, WAL mode)                                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = depot_agent::run().await {
        eprintln!("depot-agent failed to start: {}", e);
        std::process::exit(1);
    }
}
