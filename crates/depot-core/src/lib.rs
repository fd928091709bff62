//! # depot-core: Pure Domain Logic for Depot
//!
//! This crate is the **heart** of the Depot warehouse data layer. It contains
//! the domain types and all pure logic, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Depot Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Warehouse UI (external)                        │   │
//! │  │    Inventory grid ──► Pull sheets ──► Sync panel               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ command surface                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/agent commands                          │   │
//! │  │    create_item, checkout_item, sync_now, ...                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │   error   │  │ validation│  │   │
//! │  │   │ Inventory │  │  clamped  │  │ CoreError │  │   rules   │  │   │
//! │  │   │ PullSheet │  │   math    │  │           │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    depot-db (Embedded Store)                    │   │
//! │  │         SQLite queries, migrations, repositories, outbox        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, PullSheet, ChangeRecord, ...)
//! - [`stock`] - Clamped quantity arithmetic for checkout/return
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Clamped Quantities**: stock never goes negative, lines never
//!    exceed what was requested
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::{
    ChangeOp, ChangeRecord, InventoryItem, InventoryItemPatch, MaintenanceStatus,
    NewInventoryItem, NewPullSheet, NewPullSheetItem, PullSheet, PullSheetItem,
    PullSheetItemStatus, PullSheetPatch, PullSheetStatus, SyncLogEntry, SyncRunStatus,
};
