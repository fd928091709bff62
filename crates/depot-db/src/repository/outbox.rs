//! # Change-Capture Outbox Repository
//!
//! Manages the change_log table: one row per local domain mutation, queued
//! for reconciliation with the remote system of record.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  LOCAL OPERATION (e.g., checkout_item)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPDATE inventory_items SET quantity_in_stock = ...         │   │
//! │  │                                                                 │   │
//! │  │  2. INSERT INTO change_log (table_name, op, record_id,         │   │
//! │  │     old_values, new_values) VALUES (...)                       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail (atomicity guaranteed)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SYNC COORDINATOR (on demand)                    │   │
//! │  │                                                                 │   │
//! │  │  1. SELECT * FROM change_log WHERE synced_at IS NULL           │   │
//! │  │     ORDER BY created_at  (FIFO preserves causal order)         │   │
//! │  │                                                                 │   │
//! │  │  2. For each record:                                           │   │
//! │  │     a. Push to remote backend                                  │   │
//! │  │     b. On success: UPDATE change_log SET synced_at = NOW()     │   │
//! │  │     c. On failure: UPDATE change_log SET sync_attempts += 1,   │   │
//! │  │                    last_error = ?                              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • The mutation is never lost (it's in the local store)                │
//! │  • The change row is never orphaned (same transaction)                 │
//! │  • Offline? No problem - records queue up                              │
//! │  • Back online? The coordinator drains pending records                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use depot_core::{ChangeOp, ChangeRecord};

/// Columns of the change_log table, in struct field order.
const CHANGE_COLUMNS: &str = "id, table_name, op, record_id, old_values, new_values, \
     created_at, sync_attempts, last_error, synced_at";

// =============================================================================
// Inputs & Reports
// =============================================================================

/// Everything needed to capture one mutation.
#[derive(Debug)]
pub struct NewChange<'a> {
    /// Table the mutation touched.
    pub table_name: &'a str,
    /// Kind of mutation.
    pub op: ChangeOp,
    /// Primary key of the mutated row.
    pub record_id: &'a str,
    /// JSON snapshot of the row before the mutation (None for inserts).
    pub old_values: Option<String>,
    /// JSON snapshot of the row after the mutation (None for deletes).
    pub new_values: Option<String>,
}

/// Outbox population broken down by sync state.
///
/// `pending + synced == total` whenever nothing has exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ChangeCounts {
    /// Unsynced, still within the retry ceiling.
    pub pending: i64,
    /// Acknowledged by the backend.
    pub synced: i64,
    /// Unsynced and past the retry ceiling; needs a manual clear.
    pub failed: i64,
}

/// Serializes a row snapshot for a change record.
pub fn snapshot<T: Serialize>(value: &T) -> DbResult<String> {
    Ok(serde_json::to_string(value)?)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for change-capture outbox operations.
#[derive(Debug, Clone)]
pub struct ChangeLogRepository {
    pool: SqlitePool,
}

impl ChangeLogRepository {
    /// Creates a new ChangeLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChangeLogRepository { pool }
    }

    /// Captures one mutation **inside the caller's transaction**.
    ///
    /// This deliberately takes a `&mut SqliteConnection` instead of the
    /// pool: the change row must commit or roll back together with the
    /// domain write it describes. A domain write without its change row
    /// (or the reverse) is a correctness bug, not a degraded mode.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut tx = pool.begin().await?;
    /// // ... domain UPDATE ...
    /// ChangeLogRepository::record(&mut tx, NewChange {
    ///     table_name: "inventory_items",
    ///     op: ChangeOp::Update,
    ///     record_id: &item.id,
    ///     old_values: Some(snapshot(&old)?),
    ///     new_values: Some(snapshot(&new)?),
    /// }).await?;
    /// tx.commit().await?;
    /// ```
    pub async fn record(
        conn: &mut SqliteConnection,
        change: NewChange<'_>,
    ) -> DbResult<ChangeRecord> {
        let record = ChangeRecord {
            id: Uuid::new_v4().to_string(),
            table_name: change.table_name.to_string(),
            op: change.op,
            record_id: change.record_id.to_string(),
            old_values: change.old_values,
            new_values: change.new_values,
            created_at: Utc::now(),
            sync_attempts: 0,
            last_error: None,
            synced_at: None,
        };

        debug!(
            table = %record.table_name,
            op = ?record.op,
            record_id = %record.record_id,
            "Capturing change"
        );

        sqlx::query(
            "INSERT INTO change_log (
                id, table_name, op, record_id, old_values, new_values,
                created_at, sync_attempts, last_error, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&record.id)
        .bind(&record.table_name)
        .bind(record.op)
        .bind(&record.record_id)
        .bind(&record.old_values)
        .bind(&record.new_values)
        .bind(record.created_at)
        .bind(record.sync_attempts)
        .bind(&record.last_error)
        .bind(record.synced_at)
        .execute(conn)
        .await?;

        Ok(record)
    }

    /// Gets a change record by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ChangeRecord>> {
        let sql = format!("SELECT {CHANGE_COLUMNS} FROM change_log WHERE id = ?1");
        let record = sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Gets pending records that still qualify for a push.
    ///
    /// ## Arguments
    /// * `max_attempts` - retry ceiling; records past it are excluded until
    ///   an operator clears them
    /// * `limit` - maximum records to return
    ///
    /// ## Returns
    /// Records where `synced_at IS NULL`, oldest first (FIFO). Replaying in
    /// this order preserves the causal ordering of writes to one record.
    pub async fn list_pending(&self, max_attempts: i64, limit: u32) -> DbResult<Vec<ChangeRecord>> {
        let sql = format!(
            "SELECT {CHANGE_COLUMNS} FROM change_log
             WHERE synced_at IS NULL AND sync_attempts <= ?1
             ORDER BY created_at ASC
             LIMIT ?2"
        );
        let records = sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Marks a record as successfully pushed.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE change_log SET synced_at = ?2, last_error = NULL WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Records a push failure: bumps the attempt counter and stores the
    /// error text on the record.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE change_log SET
                sync_attempts = sync_attempts + 1,
                last_error = ?2
             WHERE id = ?1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Manual unstick: clears a record's error and attempt counter so it
    /// re-enters the pending pool (the operator-facing retry button).
    pub async fn clear_error(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Clearing sync error");

        sqlx::query(
            "UPDATE change_log SET
                sync_attempts = 0,
                last_error = NULL
             WHERE id = ?1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts records by sync state.
    pub async fn counts(&self, max_attempts: i64) -> DbResult<ChangeCounts> {
        let counts = sqlx::query_as::<_, ChangeCounts>(
            "SELECT
                COALESCE(SUM(CASE WHEN synced_at IS NULL AND sync_attempts <= ?1
                                  THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN synced_at IS NOT NULL
                                  THEN 1 ELSE 0 END), 0) AS synced,
                COALESCE(SUM(CASE WHEN synced_at IS NULL AND sync_attempts > ?1
                                  THEN 1 ELSE 0 END), 0) AS failed
             FROM change_log",
        )
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Counts all change records, regardless of state.
    pub async fn total(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM change_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes old synced records (cleanup).
    ///
    /// ## Arguments
    /// * `days_old` - Delete records synced more than this many days ago
    ///
    /// ## Returns
    /// Number of deleted records.
    pub async fn prune_synced(&self, days_old: u32) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM change_log
             WHERE synced_at IS NOT NULL
             AND synced_at < datetime('now', '-' || ?1 || ' days')",
        )
        .bind(days_old)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a standalone change record (tests only; real mutations go
    /// through the domain repositories).
    async fn insert_change(db: &Database, record_id: &str) -> ChangeRecord {
        let mut tx = db.pool().begin().await.unwrap();
        let record = ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: "inventory_items",
                op: ChangeOp::Update,
                record_id,
                old_values: Some(r#"{"quantity_in_stock":10}"#.to_string()),
                new_values: Some(r#"{"quantity_in_stock":6}"#.to_string()),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_record_and_list_pending_fifo() {
        let db = test_db().await;

        let first = insert_change(&db, "item-1").await;
        let second = insert_change(&db, "item-2").await;
        let third = insert_change(&db, "item-3").await;

        let pending = db.change_log().list_pending(3, 100).await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["item-1", "item-2", "item-3"]);
        assert!(pending.iter().all(|r| !r.is_synced()));

        // created_at is monotonically non-decreasing in FIFO order
        assert!(first.created_at <= second.created_at);
        assert!(second.created_at <= third.created_at);
    }

    #[tokio::test]
    async fn test_mark_synced_removes_from_pending() {
        let db = test_db().await;
        let record = insert_change(&db, "item-1").await;

        db.change_log().mark_synced(&record.id).await.unwrap();

        let pending = db.change_log().list_pending(3, 100).await.unwrap();
        assert!(pending.is_empty());

        let reloaded = db.change_log().get_by_id(&record.id).await.unwrap().unwrap();
        assert!(reloaded.is_synced());
    }

    #[tokio::test]
    async fn test_mark_failed_increments_attempts() {
        let db = test_db().await;
        let record = insert_change(&db, "item-1").await;

        db.change_log()
            .mark_failed(&record.id, "connection refused")
            .await
            .unwrap();

        let reloaded = db.change_log().get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(reloaded.sync_attempts, 1);
        assert_eq!(reloaded.last_error.as_deref(), Some("connection refused"));
        assert!(reloaded.synced_at.is_none());
    }

    #[tokio::test]
    async fn test_retry_exhaustion_and_clear_error() {
        let db = test_db().await;
        let record = insert_change(&db, "item-1").await;

        // Four failures push the record past the default ceiling of 3.
        for _ in 0..4 {
            db.change_log()
                .mark_failed(&record.id, "timeout")
                .await
                .unwrap();
        }

        let counts = db.change_log().counts(3).await.unwrap();
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.failed, 1);
        assert!(db.change_log().list_pending(3, 100).await.unwrap().is_empty());

        // Manual unstick returns it to the pending pool.
        db.change_log().clear_error(&record.id).await.unwrap();

        let reloaded = db.change_log().get_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(reloaded.sync_attempts, 0);
        assert!(reloaded.last_error.is_none());

        let pending = db.change_log().list_pending(3, 100).await.unwrap();
        assert_eq!(pending.len(), 1);
        let counts = db.change_log().counts(3).await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.failed, 0);
    }

    #[tokio::test]
    async fn test_counts_partition_the_outbox() {
        let db = test_db().await;

        let a = insert_change(&db, "item-a").await;
        let _b = insert_change(&db, "item-b").await;
        let c = insert_change(&db, "item-c").await;

        db.change_log().mark_synced(&a.id).await.unwrap();
        for _ in 0..4 {
            db.change_log().mark_failed(&c.id, "boom").await.unwrap();
        }

        let counts = db.change_log().counts(3).await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.synced, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(db.change_log().total().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rollback_discards_change_row() {
        let db = test_db().await;

        let mut tx = db.pool().begin().await.unwrap();
        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: "inventory_items",
                op: ChangeOp::Insert,
                record_id: "item-x",
                old_values: None,
                new_values: Some("{}".to_string()),
            },
        )
        .await
        .unwrap();
        // Dropped without commit: the capture must vanish with the
        // transaction it belonged to.
        drop(tx);

        assert_eq!(db.change_log().total().await.unwrap(), 0);
    }
}
