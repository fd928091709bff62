//! # Repository Module
//!
//! Repository implementations for the Depot store.
//!
//! ```text
//! repository/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── item.rs        ◄─── Inventory items (CRUD + stock transitions)
//! ├── pull_sheet.rs  ◄─── Pull sheets and their line items
//! ├── outbox.rs      ◄─── Change-capture outbox (change_log)
//! └── sync_log.rs    ◄─── Sync run audit trail
//! ```
//!
//! Every domain mutation in `item` and `pull_sheet` commits atomically with
//! a change row appended through `outbox::ChangeLogRepository::record`.

pub mod item;
pub mod outbox;
pub mod pull_sheet;
pub mod sync_log;
