//! # Inventory Commands
//!
//! Command handlers for inventory item search, CRUD, and stock transitions.
//!
//! ## Handler Shape
//! Every handler validates its input, delegates to the item repository
//! (which wraps the write and its change capture in one transaction), and
//! folds the outcome into the uniform response envelope. The row returned
//! is always re-read from the store after the write.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{respond, ApiError, CommandResponse};
use crate::state::DbState;
use depot_core::validation;
use depot_core::{InventoryItem, InventoryItemPatch, MaintenanceStatus, NewInventoryItem};

/// Default/maximum page sizes for list and search.
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

// =============================================================================
// DTO
// =============================================================================

/// Inventory item DTO for the UI layer.
///
/// ## Why a DTO?
/// - Decouples the stored row from the API contract
/// - serde renames to camelCase for JS consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemDto {
    pub id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub quantity_in_stock: i64,
    pub category: Option<String>,
    pub location: Option<String>,
    pub unit_value_cents: Option<i64>,
    pub purchase_cost_cents: Option<i64>,
    pub purchase_date: Option<String>,
    pub maintenance_status: MaintenanceStatus,
    pub repair_cost_cents: Option<i64>,
    pub image_ref: Option<String>,
    pub updated_at: String,
    pub is_synced: bool,
}

impl From<InventoryItem> for InventoryItemDto {
    fn from(item: InventoryItem) -> Self {
        InventoryItemDto {
            id: item.id,
            name: item.name,
            barcode: item.barcode,
            quantity_in_stock: item.quantity_in_stock,
            category: item.category,
            location: item.location,
            unit_value_cents: item.unit_value_cents,
            purchase_cost_cents: item.purchase_cost_cents,
            purchase_date: item.purchase_date.map(|d| d.to_rfc3339()),
            maintenance_status: item.maintenance_status,
            repair_cost_cents: item.repair_cost_cents,
            image_ref: item.image_ref,
            updated_at: item.updated_at.to_rfc3339(),
            is_synced: item.is_synced,
        }
    }
}

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

// =============================================================================
// Commands
// =============================================================================

/// Lists inventory items sorted by name.
pub async fn list_items(
    db: &DbState,
    limit: Option<u32>,
) -> CommandResponse<Vec<InventoryItemDto>> {
    respond(
        async {
            let items = db.inner().items().list(clamp_limit(limit)).await?;
            Ok(items.into_iter().map(InventoryItemDto::from).collect())
        }
        .await,
    )
}

/// Gets a single item by its UUID.
pub async fn get_item(db: &DbState, id: String) -> CommandResponse<InventoryItemDto> {
    respond(
        async {
            let item = db
                .inner()
                .items()
                .get_by_id(&id)
                .await?
                .ok_or_else(|| ApiError::not_found("Inventory item", &id))?;
            Ok(InventoryItemDto::from(item))
        }
        .await,
    )
}

/// Exact barcode lookup.
///
/// Barcode scanners "type" the full code in under 50ms; this is the fast
/// path the scan screen hits, skipping fuzzy search entirely.
pub async fn search_by_barcode(db: &DbState, code: String) -> CommandResponse<InventoryItemDto> {
    respond(
        async {
            validation::validate_barcode(&code)?;
            let item = db
                .inner()
                .items()
                .get_by_barcode(code.trim())
                .await?
                .ok_or_else(|| ApiError::not_found("Inventory item", &code))?;
            Ok(InventoryItemDto::from(item))
        }
        .await,
    )
}

/// Fuzzy name search. An empty query returns the default list.
pub async fn search_by_name(
    db: &DbState,
    query: String,
    limit: Option<u32>,
) -> CommandResponse<Vec<InventoryItemDto>> {
    respond(
        async {
            let query = validation::validate_search_query(&query)?;
            let items = db
                .inner()
                .items()
                .search_by_name(&query, clamp_limit(limit))
                .await?;
            Ok(items.into_iter().map(InventoryItemDto::from).collect())
        }
        .await,
    )
}

/// Creates an inventory item.
pub async fn create_item(db: &DbState, item: NewInventoryItem) -> CommandResponse<InventoryItemDto> {
    debug!(name = %item.name, "create_item command");

    respond(
        async {
            validation::validate_name("name", &item.name)?;
            validation::validate_stock_level(item.quantity_in_stock)?;
            if let Some(ref barcode) = item.barcode {
                validation::validate_barcode(barcode)?;
            }

            let created = db.inner().items().create(item).await?;
            Ok(InventoryItemDto::from(created))
        }
        .await,
    )
}

/// Applies a partial update to an item.
pub async fn update_item(
    db: &DbState,
    id: String,
    patch: InventoryItemPatch,
) -> CommandResponse<InventoryItemDto> {
    debug!(id = %id, "update_item command");

    respond(
        async {
            if patch.is_empty() {
                return Err(depot_core::ValidationError::EmptyPatch.into());
            }
            if let Some(ref name) = patch.name {
                validation::validate_name("name", name)?;
            }
            if let Some(ref barcode) = patch.barcode {
                validation::validate_barcode(barcode)?;
            }
            if let Some(qty) = patch.quantity_in_stock {
                validation::validate_stock_level(qty)?;
            }

            let updated = db.inner().items().update(&id, &patch).await?;
            Ok(InventoryItemDto::from(updated))
        }
        .await,
    )
}

/// Checks out `qty` units of an item. Stock clamps at zero.
pub async fn checkout_item(db: &DbState, id: String, qty: i64) -> CommandResponse<InventoryItemDto> {
    debug!(id = %id, qty = %qty, "checkout_item command");

    respond(
        async {
            validation::validate_transition_qty(qty)?;
            let item = db.inner().items().checkout(&id, qty).await?;
            Ok(InventoryItemDto::from(item))
        }
        .await,
    )
}

/// Returns `qty` units of an item to stock.
pub async fn return_item(db: &DbState, id: String, qty: i64) -> CommandResponse<InventoryItemDto> {
    debug!(id = %id, qty = %qty, "return_item command");

    respond(
        async {
            validation::validate_transition_qty(qty)?;
            let item = db.inner().items().return_to_stock(&id, qty).await?;
            Ok(InventoryItemDto::from(item))
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
    use depot_db::{Database, DbConfig};

    async fn test_state() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn speaker(qty: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: "Speaker A".to_string(),
            quantity_in_stock: qty,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_inventory_lifecycle_scenario() {
        let db = test_state().await;

        // Create {name: "Speaker A", qty: 10}
        let created = create_item(&db, speaker(10)).await;
        assert!(created.success);
        let created = created.data.unwrap();
        assert_eq!(created.quantity_in_stock, 10);

        // getById returns qty 10, and one insert change record exists
        let fetched = get_item(&db, created.id.clone()).await.data.unwrap();
        assert_eq!(fetched.quantity_in_stock, 10);
        assert_eq!(db.inner().change_log().total().await.unwrap(), 1);

        // checkout 4 → qty 6, second (update) change record
        let after = checkout_item(&db, created.id.clone(), 4).await.data.unwrap();
        assert_eq!(after.quantity_in_stock, 6);
        assert_eq!(db.inner().change_log().total().await.unwrap(), 2);

        // return 4 → back to 10
        let back = return_item(&db, created.id.clone(), 4).await.data.unwrap();
        assert_eq!(back.quantity_in_stock, 10);
    }

    #[tokio::test]
    async fn test_get_missing_item_is_structured_error() {
        let db = test_state().await;

        let res = get_item(&db, "ghost".to_string()).await;
        assert!(!res.success);
        assert!(res.data.is_none());
        assert_eq!(res.code, Some(ErrorCode::NotFound));
        assert!(res.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = test_state().await;

        let res = create_item(&db, speaker(-1)).await;
        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::ValidationError));

        let mut unnamed = speaker(1);
        unnamed.name = "  ".to_string();
        let res = create_item(&db, unnamed).await;
        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::ValidationError));

        // Nothing invalid was stored or captured.
        assert_eq!(db.inner().change_log().total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_rejects_non_positive_qty() {
        let db = test_state().await;
        let item = create_item(&db, speaker(5)).await.data.unwrap();

        let res = checkout_item(&db, item.id.clone(), 0).await;
        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::ValidationError));

        let res = checkout_item(&db, item.id, -2).await;
        assert!(!res.success);
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let db = test_state().await;
        let item = create_item(&db, speaker(5)).await.data.unwrap();

        let res = update_item(&db, item.id, InventoryItemPatch::default()).await;
        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn test_duplicate_barcode_surfaces_as_conflict() {
        let db = test_state().await;

        let mut first = speaker(1);
        first.barcode = Some("DEP-000123".to_string());
        assert!(create_item(&db, first).await.success);

        let mut second = speaker(1);
        second.name = "Speaker B".to_string();
        second.barcode = Some("DEP-000123".to_string());
        let res = create_item(&db, second).await;

        assert!(!res.success);
        assert_eq!(res.code, Some(ErrorCode::Conflict));
    }

    #[tokio::test]
    async fn test_barcode_search() {
        let db = test_state().await;

        let mut item = speaker(2);
        item.barcode = Some("DEP-000123".to_string());
        let created = create_item(&db, item).await.data.unwrap();

        let found = search_by_barcode(&db, "DEP-000123".to_string()).await;
        assert!(found.success);
        assert_eq!(found.data.unwrap().id, created.id);

        let missing = search_by_barcode(&db, "DEP-999999".to_string()).await;
        assert!(!missing.success);
        assert_eq!(missing.code, Some(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn test_name_search_and_list() {
        let db = test_state().await;
        create_item(&db, speaker(1)).await.data.unwrap();

        let hits = search_by_name(&db, "speak".to_string(), None).await.data.unwrap();
        assert_eq!(hits.len(), 1);

        let all = list_items(&db, None).await.data.unwrap();
        assert_eq!(all.len(), 1);
    }
}
