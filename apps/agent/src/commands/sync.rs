//! # Sync Commands
//!
//! Command handlers for the sync panel.
//!
//! ## Command Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Commands                                    │
//! │                                                                         │
//! │  get_sync_status()     - pending/synced/failed counts + last run       │
//! │  get_pending_changes() - the FIFO pending pool                         │
//! │  sync_now()            - one manual sync run (serialized internally)   │
//! │  clear_sync_error()    - re-arm an exhausted change record             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{respond, CommandResponse};
use crate::state::SyncState;
use depot_core::{ChangeOp, ChangeRecord};
use depot_sync::{SyncOutcome, SyncStatus};

const DEFAULT_LIMIT: u32 = 200;

// =============================================================================
// DTOs
// =============================================================================

/// Sync status DTO for the sync panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusDto {
    pub pending: i64,
    pub synced: i64,
    pub failed: i64,
    pub last_synced_at: Option<String>,
}

impl From<SyncStatus> for SyncStatusDto {
    fn from(status: SyncStatus) -> Self {
        SyncStatusDto {
            pending: status.pending,
            synced: status.synced,
            failed: status.failed,
            last_synced_at: status.last_synced_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// A change record as shown in the pending-changes list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecordDto {
    pub id: String,
    pub table_name: String,
    pub op: ChangeOp,
    pub record_id: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub created_at: String,
    pub sync_attempts: i64,
    pub last_error: Option<String>,
    pub synced_at: Option<String>,
}

impl From<ChangeRecord> for ChangeRecordDto {
    fn from(record: ChangeRecord) -> Self {
        ChangeRecordDto {
            id: record.id,
            table_name: record.table_name,
            op: record.op,
            record_id: record.record_id,
            old_values: record.old_values,
            new_values: record.new_values,
            created_at: record.created_at.to_rfc3339(),
            sync_attempts: record.sync_attempts,
            last_error: record.last_error,
            synced_at: record.synced_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// Outcome of a manual sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcomeDto {
    pub run_id: String,
    pub pushed: i64,
    pub failed: i64,
}

impl From<SyncOutcome> for SyncOutcomeDto {
    fn from(outcome: SyncOutcome) -> Self {
        SyncOutcomeDto {
            run_id: outcome.run_id,
            pushed: outcome.pushed,
            failed: outcome.failed,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Gets the current sync status.
pub async fn get_sync_status(sync: &SyncState) -> CommandResponse<SyncStatusDto> {
    respond(
        async {
            let status = sync.coordinator().status().await?;
            Ok(SyncStatusDto::from(status))
        }
        .await,
    )
}

/// Lists the pending change records, oldest first.
pub async fn get_pending_changes(
    sync: &SyncState,
    limit: Option<u32>,
) -> CommandResponse<Vec<ChangeRecordDto>> {
    respond(
        async {
            let records = sync
                .coordinator()
                .pending_changes(limit.unwrap_or(DEFAULT_LIMIT))
                .await?;
            Ok(records.into_iter().map(ChangeRecordDto::from).collect())
        }
        .await,
    )
}

/// Runs one sync pass now.
///
/// The coordinator serializes runs internally; a second call while one is
/// in flight fails with a CONFLICT instead of double-pushing the batch.
pub async fn sync_now(sync: &SyncState) -> CommandResponse<SyncOutcomeDto> {
    debug!("sync_now command");

    respond(
        async {
            let outcome = sync.coordinator().sync_now().await?;
            Ok(SyncOutcomeDto::from(outcome))
        }
        .await,
    )
}

/// Clears a change record's error and attempt counter so it re-enters the
/// pending pool (the operator-facing retry button).
pub async fn clear_sync_error(
    sync: &SyncState,
    change_id: String,
) -> CommandResponse<ChangeRecordDto> {
    debug!(change_id = %change_id, "clear_sync_error command");

    respond(
        async {
            let record = sync.coordinator().clear_error(&change_id).await?;
            Ok(ChangeRecordDto::from(record))
        }
        .await,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::DbState;
    use depot_core::NewInventoryItem;
    use depot_db::{Database, DbConfig};
    use depot_sync::{SimulatedBackend, SyncCoordinator, SyncPolicy};
    use std::sync::Arc;

    async fn test_states() -> (DbState, SyncState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = SyncCoordinator::new(
            db.clone(),
            Arc::new(SimulatedBackend),
            SyncPolicy::default(),
        );
        (DbState::new(db), SyncState::new(Arc::new(coordinator)))
    }

    async fn seed_item(db: &DbState) {
        db.inner()
            .items()
            .create(NewInventoryItem {
                name: "Speaker A".to_string(),
                quantity_in_stock: 10,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_and_pending_changes() {
        let (db, sync) = test_states().await;
        seed_item(&db).await;

        let status = get_sync_status(&sync).await.data.unwrap();
        assert_eq!(status.pending, 1);
        assert_eq!(status.synced, 0);
        assert!(status.last_synced_at.is_none());

        let pending = get_pending_changes(&sync, None).await.data.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].table_name, "inventory_items");
        assert_eq!(pending[0].op, ChangeOp::Insert);
        assert!(pending[0].synced_at.is_none());
    }

    #[tokio::test]
    async fn test_sync_now_reports_outcome_and_updates_status() {
        let (db, sync) = test_states().await;
        seed_item(&db).await;
        seed_item(&db).await;

        let outcome = sync_now(&sync).await.data.unwrap();
        assert_eq!(outcome.pushed, 2);
        assert_eq!(outcome.failed, 0);

        let status = get_sync_status(&sync).await.data.unwrap();
        assert_eq!(status.pending, 0);
        assert_eq!(status.synced, 2);
        assert!(status.last_synced_at.is_some());
    }

    #[tokio::test]
    async fn test_clear_error_on_unknown_record() {
        let (_db, sync) = test_states().await;

        let res = clear_sync_error(&sync, "ghost".to_string()).await;
        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::NotFound));
    }
}
