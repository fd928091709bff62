//! # Sync Log Repository
//!
//! Append-only audit trail of sync runs. Every `sync_now` opens a row in
//! `started` status and closes it as `completed` or `failed`; the timestamp
//! of the newest completed row is the "last synced" the UI shows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use depot_core::{SyncLogEntry, SyncRunStatus};

/// Columns of the sync_log table, in struct field order.
const LOG_COLUMNS: &str = "id, status, pushed, pulled, error, started_at, finished_at";

/// Repository for sync audit log operations.
#[derive(Debug, Clone)]
pub struct SyncLogRepository {
    pool: SqlitePool,
}

impl SyncLogRepository {
    /// Creates a new SyncLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncLogRepository { pool }
    }

    /// Opens a sync run: inserts a row in `started` status.
    pub async fn begin_run(&self) -> DbResult<SyncLogEntry> {
        let entry = SyncLogEntry {
            id: Uuid::new_v4().to_string(),
            status: SyncRunStatus::Started,
            pushed: 0,
            pulled: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        };

        debug!(id = %entry.id, "Beginning sync run");

        sqlx::query(
            "INSERT INTO sync_log (id, status, pushed, pulled, error, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&entry.id)
        .bind(entry.status)
        .bind(entry.pushed)
        .bind(entry.pulled)
        .bind(&entry.error)
        .bind(entry.started_at)
        .bind(entry.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Closes a run as completed, recording what moved.
    pub async fn complete_run(&self, id: &str, pushed: i64, pulled: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sync_log SET
                status = ?2, pushed = ?3, pulled = ?4, finished_at = ?5
             WHERE id = ?1",
        )
        .bind(id)
        .bind(SyncRunStatus::Completed)
        .bind(pushed)
        .bind(pulled)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sync run", id));
        }

        Ok(())
    }

    /// Closes a run as failed, keeping whatever partial counts were reached.
    pub async fn fail_run(&self, id: &str, pushed: i64, error: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE sync_log SET
                status = ?2, pushed = ?3, error = ?4, finished_at = ?5
             WHERE id = ?1",
        )
        .bind(id)
        .bind(SyncRunStatus::Failed)
        .bind(pushed)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sync run", id));
        }

        Ok(())
    }

    /// The most recently completed run, if any.
    pub async fn last_completed(&self) -> DbResult<Option<SyncLogEntry>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM sync_log
             WHERE status = ?1
             ORDER BY finished_at DESC
             LIMIT 1"
        );
        let entry = sqlx::query_as::<_, SyncLogEntry>(&sql)
            .bind(SyncRunStatus::Completed)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Recent runs, newest first (operator-facing activity feed).
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SyncLogEntry>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM sync_log ORDER BY started_at DESC LIMIT ?1"
        );
        let entries = sqlx::query_as::<_, SyncLogEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
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

    #[tokio::test]
    async fn test_begin_and_complete_run() {
        let db = test_db().await;

        let run = db.sync_log().begin_run().await.unwrap();
        assert_eq!(run.status, SyncRunStatus::Started);
        assert!(db.sync_log().last_completed().await.unwrap().is_none());

        db.sync_log().complete_run(&run.id, 7, 0).await.unwrap();

        let last = db.sync_log().last_completed().await.unwrap().unwrap();
        assert_eq!(last.id, run.id);
        assert_eq!(last.pushed, 7);
        assert!(last.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_run_is_not_last_completed() {
        let db = test_db().await;

        let run = db.sync_log().begin_run().await.unwrap();
        db.sync_log()
            .fail_run(&run.id, 2, "backend unreachable")
            .await
            .unwrap();

        assert!(db.sync_log().last_completed().await.unwrap().is_none());

        let recent = db.sync_log().recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, SyncRunStatus::Failed);
        assert_eq!(recent[0].pushed, 2);
        assert_eq!(recent[0].error.as_deref(), Some("backend unreachable"));
    }

    #[tokio::test]
    async fn test_closing_unknown_run_is_not_found() {
        let db = test_db().await;

        let err = db.sync_log().complete_run("nope", 0, 0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
