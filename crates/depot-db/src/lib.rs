//! # depot-db: Embedded Store for Depot
//!
//! This crate owns all durable state for the Depot warehouse data layer.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Data Flow                                  │
//! │                                                                         │
//! │  Command handler (checkout_item)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (item.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │  pull_sheet,  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  outbox,      │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │  sync_log)    │    │ 002_...      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   one depot.db file per installation                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## The One Rule
//!
//! Every domain mutation commits in the same transaction as its change_log
//! row. Repositories enforce this by routing all change capture through
//! [`repository::outbox::ChangeLogRepository::record`], which only accepts
//! the caller's open transaction.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/depot.db")).await?;
//! let item = db.items().create(new_item).await?;
//! let pending = db.change_log().list_pending(3, 100).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::outbox::{ChangeCounts, ChangeLogRepository, NewChange};
pub use repository::pull_sheet::PullSheetRepository;
pub use repository::sync_log::SyncLogRepository;
