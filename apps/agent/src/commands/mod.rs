//! # Commands Module
//!
//! The command surface exposed to the warehouse UI layer.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── inventory.rs  ◄─── Inventory search, CRUD, stock transitions
//! ├── pull_sheet.rs ◄─── Pull sheets and their line items
//! ├── sync.rs       ◄─── Sync status and control
//! └── lifecycle.rs  ◄─── is_offline, get_version, quit
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI layer                                                               │
//! │  ────────                                                               │
//! │  const res = await invoke('checkout_item', { id, qty: 4 });             │
//! │         │                                                               │
//! │         │ (IPC)                                                         │
//! │         ▼                                                               │
//! │  Agent                                                                  │
//! │  ─────                                                                  │
//! │  pub async fn checkout_item(                                            │
//! │      db: &DbState,            ◄── Injected state                       │
//! │      id: String,              ◄── From invoke params                   │
//! │      qty: i64,                                                          │
//! │  ) -> CommandResponse<InventoryItemDto>                                 │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  UI receives: { success: true, data: { ... } }                          │
//! │           or: { success: false, error: "...", code: "NOT_FOUND" }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs the store
//! async fn checkout_item(db: &DbState, ...)
//!
//! // Only needs the coordinator
//! async fn sync_now(sync: &SyncState)
//!
//! // Needs the whole context (shutdown handle)
//! async fn quit(ctx: &AppContext)
//! ```

pub mod inventory;
pub mod lifecycle;
pub mod pull_sheet;
pub mod sync;
