//! # Pull Sheet Repository
//!
//! Database operations for pull sheets and their line items.
//!
//! ## Pull Sheet Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pull Sheet Lifecycle                               │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → PullSheet { status: Draft }                         │
//! │                                                                         │
//! │  2. BUILD                                                              │
//! │     └── add_item() → PullSheetItem { qty_requested: 5 }                │
//! │     └── update() → status: Active / Picking                            │
//! │                                                                         │
//! │  3. FULFILL (partial picks allowed)                                    │
//! │     └── checkout_line() → qty_checked_out: 3 of 5, status CheckedOut   │
//! │     └── checkout_line() → qty_checked_out: 5 of 5                      │
//! │                                                                         │
//! │  4. RETURN (partial returns allowed)                                   │
//! │     └── return_line() → qty_returned: 5, status Returned               │
//! │     └── update() → status: Finalized                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line quantities are clamped, never assigned: checked-out can't exceed
//! requested, returned can't exceed checked-out. Every mutation commits
//! together with its change_log row.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox::{snapshot, ChangeLogRepository, NewChange};
use depot_core::stock;
use depot_core::{
    ChangeOp, NewPullSheet, NewPullSheetItem, PullSheet, PullSheetItem, PullSheetItemStatus,
    PullSheetPatch, PullSheetStatus,
};

/// Columns of the pull_sheets table, in struct field order.
const SHEET_COLUMNS: &str = "id, code, job_id, status, scheduled_out_at, expected_return_at, \
     created_at, updated_at, is_synced";

/// Columns of the pull_sheet_items table, in struct field order.
const LINE_COLUMNS: &str = "id, pull_sheet_id, inventory_item_id, qty_requested, \
     qty_checked_out, qty_returned, status, notes, created_at, updated_at, is_synced";

const SHEET_TABLE: &str = "pull_sheets";
const LINE_TABLE: &str = "pull_sheet_items";

/// Repository for pull sheet operations.
#[derive(Debug, Clone)]
pub struct PullSheetRepository {
    pool: SqlitePool,
}

impl PullSheetRepository {
    /// Creates a new PullSheetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PullSheetRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists sheets, most recently created first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<PullSheet>> {
        let sql = format!(
            "SELECT {SHEET_COLUMNS} FROM pull_sheets ORDER BY created_at DESC LIMIT ?1"
        );
        let sheets = sqlx::query_as::<_, PullSheet>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sheets)
    }

    /// Gets a sheet by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PullSheet>> {
        let sql = format!("SELECT {SHEET_COLUMNS} FROM pull_sheets WHERE id = ?1");
        let sheet = sqlx::query_as::<_, PullSheet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sheet)
    }

    /// Lists the lines of one sheet, in the order they were added.
    pub async fn items(&self, sheet_id: &str) -> DbResult<Vec<PullSheetItem>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM pull_sheet_items
             WHERE pull_sheet_id = ?1
             ORDER BY created_at ASC"
        );
        let lines = sqlx::query_as::<_, PullSheetItem>(&sql)
            .bind(sheet_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    // =========================================================================
    // Sheet writes
    // =========================================================================

    /// Creates a draft sheet and captures an insert change record.
    pub async fn create(&self, new: NewPullSheet) -> DbResult<PullSheet> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, code = %new.code, "Creating pull sheet");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO pull_sheets (
                id, code, job_id, status, scheduled_out_at, expected_return_at,
                created_at, updated_at, is_synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&id)
        .bind(new.code.trim())
        .bind(&new.job_id)
        .bind(PullSheetStatus::Draft)
        .bind(new.scheduled_out_at)
        .bind(new.expected_return_at)
        .bind(now)
        .bind(now)
        .bind(false)
        .execute(&mut *tx)
        .await?;

        let created = Self::fetch_sheet_required(&mut tx, &id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: SHEET_TABLE,
                op: ChangeOp::Insert,
                record_id: &id,
                old_values: None,
                new_values: Some(snapshot(&created)?),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Applies a typed partial update to a sheet.
    pub async fn update(&self, id: &str, patch: &PullSheetPatch) -> DbResult<PullSheet> {
        debug!(id = %id, "Updating pull sheet");

        let mut tx = self.pool.begin().await?;

        let old = Self::fetch_sheet_required(&mut tx, id).await?;

        let mut updated = old.clone();
        patch.apply(&mut updated);
        updated.updated_at = Utc::now();
        updated.is_synced = false;

        sqlx::query(
            "UPDATE pull_sheets SET
                code = ?2,
                job_id = ?3,
                status = ?4,
                scheduled_out_at = ?5,
                expected_return_at = ?6,
                updated_at = ?7,
                is_synced = ?8
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&updated.code)
        .bind(&updated.job_id)
        .bind(updated.status)
        .bind(updated.scheduled_out_at)
        .bind(updated.expected_return_at)
        .bind(updated.updated_at)
        .bind(updated.is_synced)
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_sheet_required(&mut tx, id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: SHEET_TABLE,
                op: ChangeOp::Update,
                record_id: id,
                old_values: Some(snapshot(&old)?),
                new_values: Some(snapshot(&stored)?),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    // =========================================================================
    // Line writes
    // =========================================================================

    /// Adds a line to a sheet.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - the sheet or the referenced inventory item
    ///   doesn't exist
    pub async fn add_item(
        &self,
        sheet_id: &str,
        new: NewPullSheetItem,
    ) -> DbResult<PullSheetItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            id = %id,
            sheet_id = %sheet_id,
            inventory_item_id = %new.inventory_item_id,
            "Adding pull sheet line"
        );

        let mut tx = self.pool.begin().await?;

        // Surface missing parents as NotFound instead of a raw FK failure.
        Self::fetch_sheet_required(&mut tx, sheet_id).await?;

        let item_exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE id = ?1")
                .bind(&new.inventory_item_id)
                .fetch_one(&mut *tx)
                .await?;
        if item_exists == 0 {
            return Err(DbError::not_found("Inventory item", &new.inventory_item_id));
        }

        sqlx::query(
            "INSERT INTO pull_sheet_items (
                id, pull_sheet_id, inventory_item_id, qty_requested,
                qty_checked_out, qty_returned, status, notes,
                created_at, updated_at, is_synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&id)
        .bind(sheet_id)
        .bind(&new.inventory_item_id)
        .bind(new.qty_requested)
        .bind(0i64)
        .bind(0i64)
        .bind(PullSheetItemStatus::Pending)
        .bind(&new.notes)
        .bind(now)
        .bind(now)
        .bind(false)
        .execute(&mut *tx)
        .await?;

        let created = Self::fetch_line_required(&mut tx, sheet_id, &id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: LINE_TABLE,
                op: ChangeOp::Insert,
                record_id: &id,
                old_values: None,
                new_values: Some(snapshot(&created)?),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Checks out `qty` units against a line.
    ///
    /// The checked-out total is clamped to `qty_requested`; the line status
    /// is re-derived from the resulting quantities.
    pub async fn checkout_line(
        &self,
        sheet_id: &str,
        line_id: &str,
        qty: i64,
    ) -> DbResult<PullSheetItem> {
        debug!(sheet_id = %sheet_id, line_id = %line_id, qty = %qty, "Checking out line");

        self.apply_line_transition(sheet_id, line_id, qty, |line, qty| {
            let new_out = stock::line_checkout(line.qty_requested, line.qty_checked_out, qty);
            (new_out, line.qty_returned)
        })
        .await
    }

    /// Returns `qty` units against a line.
    ///
    /// The returned total is clamped to `qty_checked_out`.
    pub async fn return_line(
        &self,
        sheet_id: &str,
        line_id: &str,
        qty: i64,
    ) -> DbResult<PullSheetItem> {
        debug!(sheet_id = %sheet_id, line_id = %line_id, qty = %qty, "Returning line");

        self.apply_line_transition(sheet_id, line_id, qty, |line, qty| {
            let new_returned = stock::line_return(line.qty_checked_out, line.qty_returned, qty);
            (line.qty_checked_out, new_returned)
        })
        .await
    }

    /// Shared line-transition body: reads the current line inside the
    /// transaction, computes clamped quantities, derives the status, writes,
    /// and captures old/new snapshots.
    async fn apply_line_transition(
        &self,
        sheet_id: &str,
        line_id: &str,
        qty: i64,
        compute: impl FnOnce(&PullSheetItem, i64) -> (i64, i64),
    ) -> DbResult<PullSheetItem> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let old = Self::fetch_line_required(&mut tx, sheet_id, line_id).await?;

        let (new_out, new_returned) = compute(&old, qty);
        let new_status = stock::line_status(new_out, new_returned);

        sqlx::query(
            "UPDATE pull_sheet_items SET
                qty_checked_out = ?2,
                qty_returned = ?3,
                status = ?4,
                updated_at = ?5,
                is_synced = 0
             WHERE id = ?1",
        )
        .bind(line_id)
        .bind(new_out)
        .bind(new_returned)
        .bind(new_status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_line_required(&mut tx, sheet_id, line_id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: LINE_TABLE,
                op: ChangeOp::Update,
                record_id: line_id,
                old_values: Some(snapshot(&old)?),
                new_values: Some(snapshot(&stored)?),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(stored)
    }

    /// Fetches a sheet inside a transaction, failing with NotFound.
    async fn fetch_sheet_required(conn: &mut SqliteConnection, id: &str) -> DbResult<PullSheet> {
        let sql = format!("SELECT {SHEET_COLUMNS} FROM pull_sheets WHERE id = ?1");
        sqlx::query_as::<_, PullSheet>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DbError::not_found("Pull sheet", id))
    }

    /// Fetches a line inside a transaction, scoped to its sheet so a line
    /// id from another sheet reads as NotFound.
    async fn fetch_line_required(
        conn: &mut SqliteConnection,
        sheet_id: &str,
        line_id: &str,
    ) -> DbResult<PullSheetItem> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM pull_sheet_items
             WHERE id = ?1 AND pull_sheet_id = ?2"
        );
        sqlx::query_as::<_, PullSheetItem>(&sql)
            .bind(line_id)
            .bind(sheet_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DbError::not_found("Pull sheet item", line_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use depot_core::NewInventoryItem;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_item(db: &Database, qty: i64) -> String {
        db.items()
            .create(NewInventoryItem {
                name: "Speaker A".to_string(),
                quantity_in_stock: qty,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_sheet(db: &Database) -> PullSheet {
        db.pull_sheets()
            .create(NewPullSheet {
                code: "PS-2024-0113".to_string(),
                job_id: Some("job-7".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_sheet_starts_as_draft() {
        let db = test_db().await;
        let sheet = seed_sheet(&db).await;

        assert_eq!(sheet.status, PullSheetStatus::Draft);
        assert_eq!(sheet.code, "PS-2024-0113");

        let listed = db.pull_sheets().list(10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_fulfillment() {
        let db = test_db().await;
        let item_id = seed_item(&db, 20).await;
        let sheet = seed_sheet(&db).await;

        let line = db
            .pull_sheets()
            .add_item(
                &sheet.id,
                NewPullSheetItem {
                    inventory_item_id: item_id,
                    qty_requested: 5,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(line.status, PullSheetItemStatus::Pending);

        let after = db
            .pull_sheets()
            .checkout_line(&sheet.id, &line.id, 3)
            .await
            .unwrap();

        assert_eq!(after.qty_checked_out, 3);
        assert_eq!(after.qty_requested, 5); // unchanged
        assert_eq!(after.status, PullSheetItemStatus::CheckedOut);
    }

    #[tokio::test]
    async fn test_checkout_clamps_to_requested() {
        let db = test_db().await;
        let item_id = seed_item(&db, 20).await;
        let sheet = seed_sheet(&db).await;

        let line = db
            .pull_sheets()
            .add_item(
                &sheet.id,
                NewPullSheetItem {
                    inventory_item_id: item_id,
                    qty_requested: 5,
                    notes: None,
                },
            )
            .await
            .unwrap();

        let after = db
            .pull_sheets()
            .checkout_line(&sheet.id, &line.id, 99)
            .await
            .unwrap();
        assert_eq!(after.qty_checked_out, 5);
    }

    #[tokio::test]
    async fn test_return_clamps_to_checked_out_and_derives_status() {
        let db = test_db().await;
        let item_id = seed_item(&db, 20).await;
        let sheet = seed_sheet(&db).await;

        let line = db
            .pull_sheets()
            .add_item(
                &sheet.id,
                NewPullSheetItem {
                    inventory_item_id: item_id,
                    qty_requested: 5,
                    notes: None,
                },
            )
            .await
            .unwrap();

        db.pull_sheets()
            .checkout_line(&sheet.id, &line.id, 3)
            .await
            .unwrap();

        // Partial return: 2 of 3 back, still checked out.
        let partial = db
            .pull_sheets()
            .return_line(&sheet.id, &line.id, 2)
            .await
            .unwrap();
        assert_eq!(partial.qty_returned, 2);
        assert_eq!(partial.status, PullSheetItemStatus::CheckedOut);

        // Over-return clamps at what went out; line completes.
        let done = db
            .pull_sheets()
            .return_line(&sheet.id, &line.id, 50)
            .await
            .unwrap();
        assert_eq!(done.qty_returned, 3);
        assert_eq!(done.status, PullSheetItemStatus::Returned);
    }

    #[tokio::test]
    async fn test_each_line_mutation_captures_one_change() {
        let db = test_db().await;
        let item_id = seed_item(&db, 20).await;
        let sheet = seed_sheet(&db).await;

        // item insert + sheet insert so far
        let before = db.change_log().total().await.unwrap();
        assert_eq!(before, 2);

        let line = db
            .pull_sheets()
            .add_item(
                &sheet.id,
                NewPullSheetItem {
                    inventory_item_id: item_id,
                    qty_requested: 5,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(db.change_log().total().await.unwrap(), 3);

        db.pull_sheets()
            .checkout_line(&sheet.id, &line.id, 3)
            .await
            .unwrap();
        assert_eq!(db.change_log().total().await.unwrap(), 4);

        let pending = db.change_log().list_pending(3, 100).await.unwrap();
        let last = pending.last().unwrap();
        assert_eq!(last.table_name, "pull_sheet_items");
        assert_eq!(last.op, ChangeOp::Update);
        assert_eq!(last.record_id, line.id);
    }

    #[tokio::test]
    async fn test_add_item_to_missing_sheet_is_not_found() {
        let db = test_db().await;
        let item_id = seed_item(&db, 20).await;

        let err = db
            .pull_sheets()
            .add_item(
                "nope",
                NewPullSheetItem {
                    inventory_item_id: item_id,
                    qty_requested: 1,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_item_with_missing_inventory_item_is_not_found() {
        let db = test_db().await;
        let sheet = seed_sheet(&db).await;

        let err = db
            .pull_sheets()
            .add_item(
                &sheet.id,
                NewPullSheetItem {
                    inventory_item_id: "ghost".to_string(),
                    qty_requested: 1,
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_sheet_status() {
        let db = test_db().await;
        let sheet = seed_sheet(&db).await;

        let patch = PullSheetPatch {
            status: Some(PullSheetStatus::Active),
            ..Default::default()
        };
        let updated = db.pull_sheets().update(&sheet.id, &patch).await.unwrap();

        assert_eq!(updated.status, PullSheetStatus::Active);
        assert_eq!(updated.code, sheet.code);
    }
}
