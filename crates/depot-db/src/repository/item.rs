//! # Inventory Item Repository
//!
//! Database operations for warehouse inventory items.
//!
//! ## Write Path
//! Every mutation follows the same shape, inside one transaction:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   1. SELECT old row            (capture "before" snapshot)             │
//! │   2. INSERT/UPDATE             (the domain write)                       │
//! │   3. SELECT new row            (capture "after" snapshot)               │
//! │   4. INSERT INTO change_log    (the outbox append)                      │
//! │   5. COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A crash anywhere before COMMIT leaves no trace; the domain write and its
//! change record can never diverge.
//!
//! ## Stock Arithmetic
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: absolute update from a caller-held snapshot             │
//! │     UPDATE inventory_items SET quantity_in_stock = 7               │
//! │                                                                     │
//! │  ✅ CORRECT: clamped delta against the current value               │
//! │     UPDATE inventory_items                                         │
//! │     SET quantity_in_stock = MAX(0, quantity_in_stock - 3)          │
//! │                                                                     │
//! │  Two terminals checking out concurrently compose instead of        │
//! │  racing on a stale read.                                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::outbox::{snapshot, ChangeLogRepository, NewChange};
use depot_core::{
    ChangeOp, InventoryItem, InventoryItemPatch, MaintenanceStatus, NewInventoryItem,
};

/// Columns of the inventory_items table, in struct field order.
const ITEM_COLUMNS: &str = "id, name, barcode, quantity_in_stock, category, location, \
     unit_value_cents, purchase_cost_cents, purchase_date, maintenance_status, \
     repair_cost_cents, image_ref, created_at, updated_at, is_synced";

/// The table name recorded on change_log rows for this repository.
const TABLE: &str = "inventory_items";

/// Repository for inventory item operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
/// let item = repo.create(new_item).await?;
/// let item = repo.checkout(&item.id, 4).await?; // clamps at zero
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists items sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY name LIMIT ?1");
        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1");
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Gets an item by exact barcode.
    ///
    /// Barcode scanners "type" the full code in under 50ms; this exact
    /// lookup gives them an instant answer without a fuzzy search.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE barcode = ?1");
        let item = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Fuzzy name search (case-insensitive substring match).
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial; empty returns the default list)
    /// * `limit` - Maximum results to return
    pub async fn search_by_name(&self, query: &str, limit: u32) -> DbResult<Vec<InventoryItem>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching items by name");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{}%", query);
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items
             WHERE name LIKE ?1
             ORDER BY name
             LIMIT ?2"
        );
        let items = sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = items.len(), "Name search returned items");
        Ok(items)
    }

    // =========================================================================
    // Writes (each one transaction: write + change capture)
    // =========================================================================

    /// Creates a new item and captures an insert change record.
    ///
    /// ## Returns
    /// * `Ok(InventoryItem)` - the stored row, re-read after the insert
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn create(&self, new: NewInventoryItem) -> DbResult<InventoryItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %new.name, "Creating inventory item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO inventory_items (
                id, name, barcode, quantity_in_stock, category, location,
                unit_value_cents, purchase_cost_cents, purchase_date,
                maintenance_status, repair_cost_cents, image_ref,
                created_at, updated_at, is_synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&id)
        .bind(new.name.trim())
        .bind(&new.barcode)
        .bind(new.quantity_in_stock)
        .bind(&new.category)
        .bind(&new.location)
        .bind(new.unit_value_cents)
        .bind(new.purchase_cost_cents)
        .bind(new.purchase_date)
        .bind(MaintenanceStatus::Operational)
        .bind(new.repair_cost_cents)
        .bind(&new.image_ref)
        .bind(now)
        .bind(now)
        .bind(false)
        .execute(&mut *tx)
        .await?;

        let created = Self::fetch_required(&mut tx, &id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: TABLE,
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

    /// Applies a typed partial update and captures old/new snapshots.
    ///
    /// ## Returns
    /// * `Ok(InventoryItem)` - the row after the update
    /// * `Err(DbError::NotFound)` - no such item
    pub async fn update(&self, id: &str, patch: &InventoryItemPatch) -> DbResult<InventoryItem> {
        debug!(id = %id, "Updating inventory item");

        let mut tx = self.pool.begin().await?;

        let old = Self::fetch_required(&mut tx, id).await?;

        let mut updated = old.clone();
        patch.apply(&mut updated);
        updated.updated_at = Utc::now();
        updated.is_synced = false;

        sqlx::query(
            "UPDATE inventory_items SET
                name = ?2,
                barcode = ?3,
                quantity_in_stock = ?4,
                category = ?5,
                location = ?6,
                unit_value_cents = ?7,
                purchase_cost_cents = ?8,
                purchase_date = ?9,
                maintenance_status = ?10,
                repair_cost_cents = ?11,
                image_ref = ?12,
                updated_at = ?13,
                is_synced = ?14
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&updated.name)
        .bind(&updated.barcode)
        .bind(updated.quantity_in_stock)
        .bind(&updated.category)
        .bind(&updated.location)
        .bind(updated.unit_value_cents)
        .bind(updated.purchase_cost_cents)
        .bind(updated.purchase_date)
        .bind(updated.maintenance_status)
        .bind(updated.repair_cost_cents)
        .bind(&updated.image_ref)
        .bind(updated.updated_at)
        .bind(updated.is_synced)
        .execute(&mut *tx)
        .await?;

        let stored = Self::fetch_required(&mut tx, id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: TABLE,
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

    /// Checks out `qty` units: stock drops by `qty`, clamped at zero.
    ///
    /// The subtraction happens in SQL against the current value, so
    /// concurrent partial checkouts compose instead of racing on a
    /// caller-held snapshot.
    pub async fn checkout(&self, id: &str, qty: i64) -> DbResult<InventoryItem> {
        debug!(id = %id, qty = %qty, "Checking out stock");

        self.apply_stock_delta(id, "MAX(0, quantity_in_stock - ?2)", qty)
            .await
    }

    /// Returns `qty` units to the shelf: stock rises by `qty`.
    pub async fn return_to_stock(&self, id: &str, qty: i64) -> DbResult<InventoryItem> {
        debug!(id = %id, qty = %qty, "Returning stock");

        self.apply_stock_delta(id, "quantity_in_stock + ?2", qty).await
    }

    /// Shared quantity-transition body: one transaction wrapping the
    /// old-read, the arithmetic UPDATE, the new-read, and the change capture.
    async fn apply_stock_delta(
        &self,
        id: &str,
        qty_expr: &str,
        qty: i64,
    ) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let old = Self::fetch_required(&mut tx, id).await?;

        let sql = format!(
            "UPDATE inventory_items SET
                quantity_in_stock = {qty_expr},
                updated_at = ?3,
                is_synced = 0
             WHERE id = ?1"
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(qty)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let stored = Self::fetch_required(&mut tx, id).await?;

        ChangeLogRepository::record(
            &mut tx,
            NewChange {
                table_name: TABLE,
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

    /// Counts items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Fetches a row inside a transaction, failing with NotFound.
    async fn fetch_required(conn: &mut SqliteConnection, id: &str) -> DbResult<InventoryItem> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = ?1");
        sqlx::query_as::<_, InventoryItem>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory item", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use depot_core::ChangeRecord;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn speaker(qty: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: "Speaker A".to_string(),
            quantity_in_stock: qty,
            category: Some("Audio".to_string()),
            ..Default::default()
        }
    }

    async fn changes_for(db: &Database, record_id: &str) -> Vec<ChangeRecord> {
        db.change_log()
            .list_pending(i64::MAX, 1000)
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.record_id == record_id)
            .collect()
    }

    #[tokio::test]
    async fn test_create_and_get_with_insert_change() {
        let db = test_db().await;

        let item = db.items().create(speaker(10)).await.unwrap();
        assert_eq!(item.quantity_in_stock, 10);
        assert_eq!(item.maintenance_status, MaintenanceStatus::Operational);

        let loaded = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.quantity_in_stock, 10);
        assert_eq!(loaded.name, "Speaker A");

        // Exactly one change record: an insert for this row.
        let changes = changes_for(&db, &item.id).await;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].op, ChangeOp::Insert);
        assert_eq!(changes[0].table_name, "inventory_items");
        assert!(changes[0].old_values.is_none());
        assert!(changes[0].new_values.is_some());
    }

    #[tokio::test]
    async fn test_checkout_clamps_at_zero() {
        let db = test_db().await;
        let item = db.items().create(speaker(3)).await.unwrap();

        let after = db.items().checkout(&item.id, 99).await.unwrap();
        assert_eq!(after.quantity_in_stock, 0);
    }

    #[tokio::test]
    async fn test_checkout_return_round_trip() {
        let db = test_db().await;
        let item = db.items().create(speaker(10)).await.unwrap();

        let out = db.items().checkout(&item.id, 4).await.unwrap();
        assert_eq!(out.quantity_in_stock, 6);

        let back = db.items().return_to_stock(&item.id, 4).await.unwrap();
        assert_eq!(back.quantity_in_stock, 10);
    }

    #[tokio::test]
    async fn test_checkout_captures_old_and_new_quantities() {
        let db = test_db().await;
        let item = db.items().create(speaker(10)).await.unwrap();

        db.items().checkout(&item.id, 4).await.unwrap();

        let changes = changes_for(&db, &item.id).await;
        assert_eq!(changes.len(), 2); // insert + update

        let update = &changes[1];
        assert_eq!(update.op, ChangeOp::Update);

        let old: InventoryItem =
            serde_json::from_str(update.old_values.as_deref().unwrap()).unwrap();
        let new: InventoryItem =
            serde_json::from_str(update.new_values.as_deref().unwrap()).unwrap();
        assert_eq!(old.quantity_in_stock, 10);
        assert_eq!(new.quantity_in_stock, 6);
    }

    #[tokio::test]
    async fn test_update_patch_touches_only_set_fields() {
        let db = test_db().await;
        let item = db.items().create(speaker(10)).await.unwrap();

        let patch = InventoryItemPatch {
            location: Some("A3-12".to_string()),
            ..Default::default()
        };
        let updated = db.items().update(&item.id, &patch).await.unwrap();

        assert_eq!(updated.location.as_deref(), Some("A3-12"));
        assert_eq!(updated.name, "Speaker A");
        assert_eq!(updated.quantity_in_stock, 10);
        assert!(!updated.is_synced);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let db = test_db().await;

        let err = db
            .items()
            .update("nope", &InventoryItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // A failed update captures nothing.
        assert_eq!(db.change_log().total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = test_db().await;

        let mut first = speaker(1);
        first.barcode = Some("DEP-000123".to_string());
        db.items().create(first).await.unwrap();

        let mut second = speaker(1);
        second.name = "Speaker B".to_string();
        second.barcode = Some("DEP-000123".to_string());
        let err = db.items().create(second).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        // The rejected insert left no change record behind.
        assert_eq!(db.change_log().total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_barcode_and_name_search() {
        let db = test_db().await;

        let mut item = speaker(2);
        item.barcode = Some("DEP-000123".to_string());
        let created = db.items().create(item).await.unwrap();

        let by_barcode = db
            .items()
            .get_by_barcode("DEP-000123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_barcode.id, created.id);

        let by_name = db.items().search_by_name("speak", 10).await.unwrap();
        assert_eq!(by_name.len(), 1);

        let none = db.items().search_by_name("projector", 10).await.unwrap();
        assert!(none.is_empty());
    }
}
