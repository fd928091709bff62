//! # Domain Types
//!
//! Core domain types used throughout Depot.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │   PullSheet     │   │ PullSheetItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  barcode        │   │  code           │   │  pull_sheet_id  │       │
//! │  │  quantity       │   │  status         │   │  qty_requested  │       │
//! │  │  location       │   │  job_id         │   │  qty_checked_out│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ChangeRecord   │   │  SyncLogEntry   │   │   ChangeOp      │       │
//! │  │  (outbox row)   │   │  (audit row)    │   │  Insert/Update/ │       │
//! │  └─────────────────┘   └─────────────────┘   │  Delete         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual Representation
//! Every entity row carries:
//! - `id`: UUID v4 - immutable, generated locally (offline-safe)
//! - Timestamps: `created_at` / `updated_at` in UTC
//! - `is_synced`: local bookkeeping flag; the change log is authoritative

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Maintenance Status
// =============================================================================

/// Maintenance state of a piece of gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    /// Ready to go out on a job.
    Operational,
    /// Flagged for repair but still in the racks.
    NeedsRepair,
    /// At the repair bench or with a vendor.
    InRepair,
    /// Permanently out of service.
    Retired,
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        MaintenanceStatus::Operational
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A piece of warehouse gear (speaker, cable run, case, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the warehouse UI.
    pub name: String,

    /// Barcode (Code128/EAN). Optional, unique when present.
    pub barcode: Option<String>,

    /// Units currently in the warehouse. Never negative; checkout clamps at 0.
    pub quantity_in_stock: i64,

    /// Free-form category ("Audio", "Rigging", ...).
    pub category: Option<String>,

    /// Shelf/bay location ("A3-12").
    pub location: Option<String>,

    /// Replacement value per unit, in cents.
    pub unit_value_cents: Option<i64>,

    /// What we paid for it, in cents.
    pub purchase_cost_cents: Option<i64>,

    /// When it was purchased.
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<DateTime<Utc>>,

    /// Maintenance state.
    pub maintenance_status: MaintenanceStatus,

    /// Accumulated repair cost, in cents.
    pub repair_cost_cents: Option<i64>,

    /// Reference to an image asset (path or object key).
    pub image_ref: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Local bookkeeping flag; the change log is the durable sync record.
    pub is_synced: bool,
}

// =============================================================================
// Pull Sheet
// =============================================================================

/// Lifecycle status of a pull sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PullSheetStatus {
    /// Being drafted, not yet released to the floor.
    Draft,
    /// Released; gear can be picked against it.
    Active,
    /// Picking in progress.
    Picking,
    /// Job closed out; no further transitions expected.
    Finalized,
}

impl Default for PullSheetStatus {
    fn default() -> Self {
        PullSheetStatus::Draft
    }
}

/// A per-job list of gear to pull, check out, and return.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PullSheet {
    pub id: String,

    /// Human-readable sheet code ("PS-2024-0113").
    pub code: String,

    /// Job this sheet belongs to, if any.
    pub job_id: Option<String>,

    pub status: PullSheetStatus,

    /// When the gear is scheduled to leave the warehouse.
    #[ts(as = "Option<String>")]
    pub scheduled_out_at: Option<DateTime<Utc>>,

    /// When the gear is expected back.
    #[ts(as = "Option<String>")]
    pub expected_return_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub is_synced: bool,
}

// =============================================================================
// Pull Sheet Item
// =============================================================================

/// Fulfillment status of a single pull sheet line, derived from its
/// quantities after every transition (see [`crate::stock::line_status`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PullSheetItemStatus {
    /// Nothing checked out yet.
    Pending,
    /// Some gear is out (possibly a partial pick, possibly partially back).
    CheckedOut,
    /// Everything that went out has come back.
    Returned,
}

impl Default for PullSheetItemStatus {
    fn default() -> Self {
        PullSheetItemStatus::Pending
    }
}

/// One line on a pull sheet.
///
/// Invariants (enforced by clamped arithmetic in the repository layer):
/// `0 <= qty_checked_out <= qty_requested` and
/// `0 <= qty_returned <= qty_checked_out`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PullSheetItem {
    pub id: String,
    pub pull_sheet_id: String,
    pub inventory_item_id: String,

    /// Units the job needs.
    pub qty_requested: i64,

    /// Units that have physically left the warehouse.
    pub qty_checked_out: i64,

    /// Units that have come back.
    pub qty_returned: i64,

    pub status: PullSheetItemStatus,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub is_synced: bool,
}

// =============================================================================
// Change Capture (Outbox)
// =============================================================================

/// What kind of mutation a change record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One captured local mutation, queued for reconciliation with the remote
/// system of record.
///
/// Written in the same transaction as the mutation it describes, so the two
/// can never diverge. `synced_at IS NULL` means pending.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ChangeRecord {
    pub id: String,

    /// Table the mutation touched ("inventory_items", ...).
    pub table_name: String,

    pub op: ChangeOp,

    /// Primary key of the mutated row.
    pub record_id: String,

    /// JSON snapshot of the row before the mutation. NULL for inserts.
    pub old_values: Option<String>,

    /// JSON snapshot of the row after the mutation. NULL for deletes.
    pub new_values: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Number of push attempts so far.
    pub sync_attempts: i64,

    /// Last push error, if any.
    pub last_error: Option<String>,

    /// When the record was acknowledged by the backend.
    #[ts(as = "Option<String>")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    /// Whether this record has been acknowledged by the backend.
    #[inline]
    pub fn is_synced(&self) -> bool {
        self.synced_at.is_some()
    }
}

// =============================================================================
// Sync Log
// =============================================================================

/// Outcome status of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Started,
    Completed,
    Failed,
}

/// One row in the append-only sync audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SyncLogEntry {
    pub id: String,
    pub status: SyncRunStatus,

    /// Change records pushed to the backend during this run.
    pub pushed: i64,

    /// Records pulled from the backend (always 0 until pull sync exists).
    pub pulled: i64,

    pub error: Option<String>,

    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Input & Patch Types
// =============================================================================

/// Fields required to create an inventory item. Everything else defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInventoryItem {
    pub name: String,
    pub barcode: Option<String>,
    pub quantity_in_stock: i64,
    pub category: Option<String>,
    pub location: Option<String>,
    pub unit_value_cents: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<DateTime<Utc>>,
    pub repair_cost_cents: Option<i64>,
    pub image_ref: Option<String>,
}

/// Typed partial update for an inventory item: one `Option` per mutable
/// column, so the compiler enforces which fields a caller may touch.
///
/// A `Some` sets the column; `None` leaves it alone. Clearing a nullable
/// column back to NULL is not expressible through a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItemPatch {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub quantity_in_stock: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub unit_value_cents: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub purchase_date: Option<DateTime<Utc>>,
    pub maintenance_status: Option<MaintenanceStatus>,
    pub repair_cost_cents: Option<i64>,
    pub image_ref: Option<String>,
}

impl InventoryItemPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.barcode.is_none()
            && self.quantity_in_stock.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.unit_value_cents.is_none()
            && self.purchase_cost_cents.is_none()
            && self.purchase_date.is_none()
            && self.maintenance_status.is_none()
            && self.repair_cost_cents.is_none()
            && self.image_ref.is_none()
    }

    /// Applies the patch to an item in memory. Timestamps are the
    /// repository's responsibility.
    pub fn apply(&self, item: &mut InventoryItem) {
        if let Some(ref name) = self.name {
            item.name = name.clone();
        }
        if let Some(ref barcode) = self.barcode {
            item.barcode = Some(barcode.clone());
        }
        if let Some(qty) = self.quantity_in_stock {
            item.quantity_in_stock = qty;
        }
        if let Some(ref category) = self.category {
            item.category = Some(category.clone());
        }
        if let Some(ref location) = self.location {
            item.location = Some(location.clone());
        }
        if let Some(cents) = self.unit_value_cents {
            item.unit_value_cents = Some(cents);
        }
        if let Some(cents) = self.purchase_cost_cents {
            item.purchase_cost_cents = Some(cents);
        }
        if let Some(date) = self.purchase_date {
            item.purchase_date = Some(date);
        }
        if let Some(status) = self.maintenance_status {
            item.maintenance_status = status;
        }
        if let Some(cents) = self.repair_cost_cents {
            item.repair_cost_cents = Some(cents);
        }
        if let Some(ref image_ref) = self.image_ref {
            item.image_ref = Some(image_ref.clone());
        }
    }
}

/// Fields required to create a pull sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPullSheet {
    pub code: String,
    pub job_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub scheduled_out_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub expected_return_at: Option<DateTime<Utc>>,
}

/// Typed partial update for a pull sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PullSheetPatch {
    pub code: Option<String>,
    pub job_id: Option<String>,
    pub status: Option<PullSheetStatus>,
    #[ts(as = "Option<String>")]
    pub scheduled_out_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub expected_return_at: Option<DateTime<Utc>>,
}

impl PullSheetPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.job_id.is_none()
            && self.status.is_none()
            && self.scheduled_out_at.is_none()
            && self.expected_return_at.is_none()
    }

    /// Applies the patch to a sheet in memory.
    pub fn apply(&self, sheet: &mut PullSheet) {
        if let Some(ref code) = self.code {
            sheet.code = code.clone();
        }
        if let Some(ref job_id) = self.job_id {
            sheet.job_id = Some(job_id.clone());
        }
        if let Some(status) = self.status {
            sheet.status = status;
        }
        if let Some(at) = self.scheduled_out_at {
            sheet.scheduled_out_at = Some(at);
        }
        if let Some(at) = self.expected_return_at {
            sheet.expected_return_at = Some(at);
        }
    }
}

/// Fields required to add a line to a pull sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPullSheetItem {
    pub inventory_item_id: String,
    pub qty_requested: i64,
    pub notes: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_item() -> InventoryItem {
        InventoryItem {
            id: "item-1".to_string(),
            name: "Speaker A".to_string(),
            barcode: None,
            quantity_in_stock: 10,
            category: None,
            location: None,
            unit_value_cents: None,
            purchase_cost_cents: None,
            purchase_date: None,
            maintenance_status: MaintenanceStatus::Operational,
            repair_cost_cents: None,
            image_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_synced: false,
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let patch = InventoryItemPatch::default();
        assert!(patch.is_empty());

        let mut item = sample_item();
        let before = item.clone();
        patch.apply(&mut item);
        assert_eq!(item.name, before.name);
        assert_eq!(item.quantity_in_stock, before.quantity_in_stock);
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let patch = InventoryItemPatch {
            location: Some("A3-12".to_string()),
            maintenance_status: Some(MaintenanceStatus::NeedsRepair),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        let mut item = sample_item();
        patch.apply(&mut item);
        assert_eq!(item.location.as_deref(), Some("A3-12"));
        assert_eq!(item.maintenance_status, MaintenanceStatus::NeedsRepair);
        // Untouched fields survive.
        assert_eq!(item.name, "Speaker A");
        assert_eq!(item.quantity_in_stock, 10);
    }

    #[test]
    fn test_pull_sheet_status_default() {
        assert_eq!(PullSheetStatus::default(), PullSheetStatus::Draft);
        assert_eq!(PullSheetItemStatus::default(), PullSheetItemStatus::Pending);
    }

    #[test]
    fn test_change_op_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChangeOp::Insert).unwrap(),
            "\"insert\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeOp::Delete).unwrap(),
            "\"delete\""
        );
    }
}
