//! # Database State
//!
//! Wraps the `Database` handle for use in command handlers.
//!
//! ## Thread Safety
//! The `Database` struct from `depot-db` contains a `SqlitePool` which is
//! inherently thread-safe. Multiple commands can execute queries
//! concurrently without explicit locking; SQLite serializes the writers.

use depot_db::Database;

/// Wrapper around `Database` for agent state management.
///
/// ## Why a Wrapper?
/// The handle is shared across every command handler; this wrapper makes
/// the intent explicit and keeps the command signatures uniform with the
/// other state types.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database handle.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let items = db_state.inner().items().search_by_name("speaker", 20).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
