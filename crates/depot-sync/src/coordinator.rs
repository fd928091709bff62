//! # Sync Coordinator
//!
//! Aggregates outbox state and drives reconciliation with the remote
//! system of record.
//!
//! ## Sync Run Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        sync_now()                                       │
//! │                                                                         │
//! │  try_lock run guard ── already held? ──► Err(SyncInProgress)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sync_log (status = started)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Snapshot pending pool (FIFO, attempts within ceiling)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each policy-sized batch:                                          │
//! │     backend.push(batch)                                                │
//! │       ├── acked id  ──► UPDATE change_log SET synced_at = NOW()        │
//! │       ├── failed id ──► UPDATE change_log SET sync_attempts += 1,      │
//! │       │                 last_error = ?                                 │
//! │       └── Err(_)    ──► UPDATE sync_log (status = failed); bail        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE sync_log (status = completed, pushed = n)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each record gets at most one attempt per run (the run works off a
//! snapshot of the pending pool), so a record that keeps failing burns
//! through the retry ceiling across runs, not within one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backend::RemoteBackend;
use crate::error::{SyncError, SyncResult};
use crate::policy::SyncPolicy;
use depot_core::ChangeRecord;
use depot_db::Database;

// =============================================================================
// Status & Outcome
// =============================================================================

/// Aggregated outbox state, as shown in the sync panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// Unsynced records still within the retry ceiling.
    pub pending: i64,
    /// Records acknowledged by the backend.
    pub synced: i64,
    /// Records past the retry ceiling, waiting on a manual clear.
    pub failed: i64,
    /// When the last completed sync run finished.
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Result of one `sync_now` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The sync_log row for this run.
    pub run_id: String,
    /// Records acknowledged during the run.
    pub pushed: i64,
    /// Records that failed during the run (attempt counters bumped).
    pub failed: i64,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Drives sync runs and answers status queries over the outbox.
///
/// One coordinator per process, owning the run guard that serializes
/// `sync_now`. Cheap to share behind an `Arc`.
pub struct SyncCoordinator {
    db: Database,
    backend: Arc<dyn RemoteBackend>,
    policy: SyncPolicy,
    /// Serializes sync runs; `try_lock` turns reentrancy into an error
    /// instead of a double-push race on the same pending batch.
    run_guard: Mutex<()>,
}

impl SyncCoordinator {
    /// Creates a coordinator over the given store and backend.
    pub fn new(db: Database, backend: Arc<dyn RemoteBackend>, policy: SyncPolicy) -> Self {
        SyncCoordinator {
            db,
            backend,
            policy,
            run_guard: Mutex::new(()),
        }
    }

    /// The active retry/batch policy.
    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Aggregated outbox counts plus the last completed run timestamp.
    ///
    /// At any quiescent point, `pending + synced` equals the outbox row
    /// count as long as nothing has exhausted its retries (failed records
    /// are reported in their own bucket).
    pub async fn status(&self) -> SyncResult<SyncStatus> {
        let counts = self.db.change_log().counts(self.policy.max_attempts).await?;
        let last = self.db.sync_log().last_completed().await?;

        Ok(SyncStatus {
            pending: counts.pending,
            synced: counts.synced,
            failed: counts.failed,
            last_synced_at: last.and_then(|run| run.finished_at),
        })
    }

    /// The FIFO pending pool: unsynced records still within the retry
    /// ceiling. Records past the ceiling reappear here only after
    /// [`clear_error`](Self::clear_error).
    pub async fn pending_changes(&self, limit: u32) -> SyncResult<Vec<ChangeRecord>> {
        let records = self
            .db
            .change_log()
            .list_pending(self.policy.max_attempts, limit)
            .await?;

        Ok(records)
    }

    /// Runs one sync pass: drains the pending pool through the backend in
    /// policy-sized batches, marking each record synced or failed, and
    /// records the run in the sync log.
    ///
    /// ## Errors
    /// * `SyncError::SyncInProgress` - another run holds the guard
    /// * `SyncError::Backend` / `SyncError::Db` - the run itself failed;
    ///   the sync_log row is closed as failed with partial counts
    pub async fn sync_now(&self) -> SyncResult<SyncOutcome> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| SyncError::SyncInProgress)?;

        let run = self.db.sync_log().begin_run().await?;
        info!(run_id = %run.id, "Sync run started");

        // Snapshot once: each record gets at most one attempt this run.
        let pending = self
            .db
            .change_log()
            .list_pending(self.policy.max_attempts, u32::MAX)
            .await?;

        let mut pushed: i64 = 0;
        let mut failed: i64 = 0;

        for batch in pending.chunks(self.policy.batch_size.max(1) as usize) {
            let report = match self.backend.push(batch).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(run_id = %run.id, error = %e, "Sync run aborted by backend");
                    self.db
                        .sync_log()
                        .fail_run(&run.id, pushed, &e.to_string())
                        .await?;
                    return Err(e);
                }
            };

            for id in &report.acked {
                self.db.change_log().mark_synced(id).await?;
                pushed += 1;
            }

            for failure in &report.failed {
                warn!(
                    change_id = %failure.change_id,
                    error = %failure.error,
                    "Change record failed to push"
                );
                self.db
                    .change_log()
                    .mark_failed(&failure.change_id, &failure.error)
                    .await?;
                failed += 1;
            }
        }

        self.db.sync_log().complete_run(&run.id, pushed, 0).await?;
        info!(run_id = %run.id, pushed, failed, "Sync run completed");

        Ok(SyncOutcome {
            run_id: run.id,
            pushed,
            failed,
        })
    }

    /// Manual unstick for one record: resets its attempt counter and error
    /// so it re-enters the pending pool. Returns the refreshed record.
    pub async fn clear_error(&self, change_id: &str) -> SyncResult<ChangeRecord> {
        let outbox = self.db.change_log();

        // Surface a missing id as NotFound rather than silently updating
        // zero rows.
        outbox
            .get_by_id(change_id)
            .await?
            .ok_or_else(|| depot_db::DbError::not_found("Change record", change_id))?;

        outbox.clear_error(change_id).await?;

        let refreshed = outbox
            .get_by_id(change_id)
            .await?
            .ok_or_else(|| depot_db::DbError::not_found("Change record", change_id))?;

        Ok(refreshed)
    }

    /// Deletes synced records older than the policy's prune window.
    pub async fn prune_synced(&self) -> SyncResult<u64> {
        let pruned = self
            .db
            .change_log()
            .prune_synced(self.policy.prune_after_days)
            .await?;

        if pruned > 0 {
            info!(pruned, "Pruned old synced change records");
        }

        Ok(pruned)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{PushFailure, PushReport, SimulatedBackend};
    use async_trait::async_trait;
    use depot_core::NewInventoryItem;
    use depot_db::DbConfig;
    use std::time::Duration;

    /// Backend that rejects every record.
    struct RejectingBackend;

    #[async_trait]
    impl RemoteBackend for RejectingBackend {
        async fn push(&self, batch: &[ChangeRecord]) -> SyncResult<PushReport> {
            Ok(PushReport {
                acked: Vec::new(),
                failed: batch
                    .iter()
                    .map(|c| PushFailure {
                        change_id: c.id.clone(),
                        error: "upstream rejected".to_string(),
                    })
                    .collect(),
            })
        }
    }

    /// Backend that sleeps before acking (for reentrancy tests).
    struct SlowBackend;

    #[async_trait]
    impl RemoteBackend for SlowBackend {
        async fn push(&self, batch: &[ChangeRecord]) -> SyncResult<PushReport> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(PushReport::ack_all(batch))
        }
    }

    /// Backend that dies at the transport level.
    struct BrokenBackend;

    #[async_trait]
    impl RemoteBackend for BrokenBackend {
        async fn push(&self, _batch: &[ChangeRecord]) -> SyncResult<PushReport> {
            Err(SyncError::Backend("connection refused".to_string()))
        }
    }

    async fn coordinator_with(backend: Arc<dyn RemoteBackend>) -> (Database, SyncCoordinator) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = SyncCoordinator::new(db.clone(), backend, SyncPolicy::default());
        (db, coordinator)
    }

    async fn seed_items(db: &Database, count: usize) {
        for i in 0..count {
            db.items()
                .create(NewInventoryItem {
                    name: format!("Speaker {}", i),
                    quantity_in_stock: 10,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_status_counts_match_outbox() {
        let (db, coordinator) = coordinator_with(Arc::new(SimulatedBackend)).await;
        seed_items(&db, 3).await;

        let status = coordinator.status().await.unwrap();
        assert_eq!(status.pending, 3);
        assert_eq!(status.synced, 0);
        assert_eq!(status.failed, 0);
        assert!(status.last_synced_at.is_none());

        // pending + synced accounts for every outbox row
        let total = db.change_log().total().await.unwrap();
        assert_eq!(status.pending + status.synced, total);
    }

    #[tokio::test]
    async fn test_sync_now_drains_pending() {
        let (db, coordinator) = coordinator_with(Arc::new(SimulatedBackend)).await;
        seed_items(&db, 5).await;

        let outcome = coordinator.sync_now().await.unwrap();
        assert_eq!(outcome.pushed, 5);
        assert_eq!(outcome.failed, 0);

        let status = coordinator.status().await.unwrap();
        assert_eq!(status.pending, 0);
        assert_eq!(status.synced, 5);
        assert!(status.last_synced_at.is_some());

        // The invariant holds after the run too.
        let total = db.change_log().total().await.unwrap();
        assert_eq!(status.pending + status.synced, total);

        // The run is in the audit log with its push count.
        let last = db.sync_log().last_completed().await.unwrap().unwrap();
        assert_eq!(last.id, outcome.run_id);
        assert_eq!(last.pushed, 5);
    }

    #[tokio::test]
    async fn test_sync_now_with_empty_outbox_completes() {
        let (db, coordinator) = coordinator_with(Arc::new(SimulatedBackend)).await;

        let outcome = coordinator.sync_now().await.unwrap();
        assert_eq!(outcome.pushed, 0);

        assert!(db.sync_log().last_completed().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejections_burn_through_retry_ceiling() {
        let (db, coordinator) = coordinator_with(Arc::new(RejectingBackend)).await;
        seed_items(&db, 1).await;

        // One attempt per run; default ceiling of 3 exhausts on run 4.
        for _ in 0..4 {
            let outcome = coordinator.sync_now().await.unwrap();
            assert_eq!(outcome.pushed, 0);
        }

        let status = coordinator.status().await.unwrap();
        assert_eq!(status.pending, 0);
        assert_eq!(status.failed, 1);

        // Exhausted records are out of the pool until cleared.
        assert!(coordinator.pending_changes(100).await.unwrap().is_empty());

        let record = db.change_log().list_pending(i64::MAX, 1).await.unwrap();
        assert_eq!(record[0].sync_attempts, 4);
        assert_eq!(record[0].last_error.as_deref(), Some("upstream rejected"));
    }

    #[tokio::test]
    async fn test_clear_error_rearms_record() {
        let (db, coordinator) = coordinator_with(Arc::new(RejectingBackend)).await;
        seed_items(&db, 1).await;

        for _ in 0..4 {
            coordinator.sync_now().await.unwrap();
        }
        let exhausted = db.change_log().list_pending(i64::MAX, 1).await.unwrap();
        let change_id = exhausted[0].id.clone();

        let cleared = coordinator.clear_error(&change_id).await.unwrap();
        assert_eq!(cleared.sync_attempts, 0);
        assert!(cleared.last_error.is_none());

        let pending = coordinator.pending_changes(100).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, change_id);
    }

    #[tokio::test]
    async fn test_clear_error_unknown_id_is_not_found() {
        let (_db, coordinator) = coordinator_with(Arc::new(SimulatedBackend)).await;

        let err = coordinator.clear_error("nope").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Db(depot_db::DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_fault_fails_the_run() {
        let (db, coordinator) = coordinator_with(Arc::new(BrokenBackend)).await;
        seed_items(&db, 2).await;

        let err = coordinator.sync_now().await.unwrap_err();
        assert!(matches!(err, SyncError::Backend(_)));

        // No record was marked; the run is logged as failed.
        let status = coordinator.status().await.unwrap();
        assert_eq!(status.pending, 2);
        assert!(db.sync_log().last_completed().await.unwrap().is_none());

        let recent = db.sync_log().recent(1).await.unwrap();
        assert_eq!(recent[0].status, depot_core::SyncRunStatus::Failed);
    }

    #[tokio::test]
    async fn test_concurrent_sync_now_is_rejected() {
        let (db, coordinator) = coordinator_with(Arc::new(SlowBackend)).await;
        seed_items(&db, 1).await;

        let coordinator = Arc::new(coordinator);
        let first = {
            let c = Arc::clone(&coordinator);
            tokio::spawn(async move { c.sync_now().await })
        };

        // Give the first run time to take the guard.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = coordinator.sync_now().await;
        assert!(matches!(second, Err(SyncError::SyncInProgress)));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.pushed, 1);
    }
}
