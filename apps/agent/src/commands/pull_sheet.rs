//! # Pull Sheet Commands
//!
//! Command handlers for pull sheets and their line items.
//!
//! Sheet-level gating lives here (a finalized sheet accepts no further
//! mutations); the quantity clamps live in the repository so they hold no
//! matter who calls it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{respond, ApiError, CommandResponse};
use crate::state::DbState;
use depot_core::validation;
use depot_core::{
    CoreError, NewPullSheet, NewPullSheetItem, PullSheet, PullSheetItem, PullSheetItemStatus,
    PullSheetPatch, PullSheetStatus,
};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

// =============================================================================
// DTOs
// =============================================================================

/// Pull sheet DTO for the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSheetDto {
    pub id: String,
    pub code: String,
    pub job_id: Option<String>,
    pub status: PullSheetStatus,
    pub scheduled_out_at: Option<String>,
    pub expected_return_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub is_synced: bool,
}

impl From<PullSheet> for PullSheetDto {
    fn from(sheet: PullSheet) -> Self {
        PullSheetDto {
            id: sheet.id,
            code: sheet.code,
            job_id: sheet.job_id,
            status: sheet.status,
            scheduled_out_at: sheet.scheduled_out_at.map(|d| d.to_rfc3339()),
            expected_return_at: sheet.expected_return_at.map(|d| d.to_rfc3339()),
            created_at: sheet.created_at.to_rfc3339(),
            updated_at: sheet.updated_at.to_rfc3339(),
            is_synced: sheet.is_synced,
        }
    }
}

/// Pull sheet line DTO.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSheetItemDto {
    pub id: String,
    pub pull_sheet_id: String,
    pub inventory_item_id: String,
    pub qty_requested: i64,
    pub qty_checked_out: i64,
    pub qty_returned: i64,
    pub status: PullSheetItemStatus,
    pub notes: Option<String>,
    pub updated_at: String,
    pub is_synced: bool,
}

impl From<PullSheetItem> for PullSheetItemDto {
    fn from(line: PullSheetItem) -> Self {
        PullSheetItemDto {
            id: line.id,
            pull_sheet_id: line.pull_sheet_id,
            inventory_item_id: line.inventory_item_id,
            qty_requested: line.qty_requested,
            qty_checked_out: line.qty_checked_out,
            qty_returned: line.qty_returned,
            status: line.status,
            notes: line.notes,
            updated_at: line.updated_at.to_rfc3339(),
            is_synced: line.is_synced,
        }
    }
}

/// A sheet together with its lines (the detail view payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSheetWithItemsDto {
    #[serde(flatten)]
    pub sheet: PullSheetDto,
    pub items: Vec<PullSheetItemDto>,
}

fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
}

/// Loads a sheet and rejects mutations against a finalized one.
async fn fetch_open_sheet(db: &DbState, sheet_id: &str, operation: &str) -> Result<PullSheet, ApiError> {
    let sheet = db
        .inner()
        .pull_sheets()
        .get_by_id(sheet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Pull sheet", sheet_id))?;

    if sheet.status == PullSheetStatus::Finalized {
        return Err(CoreError::InvalidSheetStatus {
            sheet_id: sheet_id.to_string(),
            status: "finalized".to_string(),
            operation: operation.to_string(),
        }
        .into());
    }

    Ok(sheet)
}

// =============================================================================
// Commands
// =============================================================================

/// Lists pull sheets, newest first.
pub async fn list_pull_sheets(
    db: &DbState,
    limit: Option<u32>,
) -> CommandResponse<Vec<PullSheetDto>> {
    respond(
        async {
            let sheets = db.inner().pull_sheets().list(clamp_limit(limit)).await?;
            Ok(sheets.into_iter().map(PullSheetDto::from).collect())
        }
        .await,
    )
}

/// Gets one sheet with all of its lines.
pub async fn get_pull_sheet(db: &DbState, id: String) -> CommandResponse<PullSheetWithItemsDto> {
    respond(
        async {
            let repo = db.inner().pull_sheets();
            let sheet = repo
                .get_by_id(&id)
                .await?
                .ok_or_else(|| ApiError::not_found("Pull sheet", &id))?;
            let items = repo.items(&id).await?;

            Ok(PullSheetWithItemsDto {
                sheet: PullSheetDto::from(sheet),
                items: items.into_iter().map(PullSheetItemDto::from).collect(),
            })
        }
        .await,
    )
}

/// Creates a draft pull sheet.
pub async fn create_pull_sheet(db: &DbState, sheet: NewPullSheet) -> CommandResponse<PullSheetDto> {
    debug!(code = %sheet.code, "create_pull_sheet command");

    respond(
        async {
            validation::validate_name("code", &sheet.code)?;
            let created = db.inner().pull_sheets().create(sheet).await?;
            Ok(PullSheetDto::from(created))
        }
        .await,
    )
}

/// Applies a partial update to a sheet.
pub async fn update_pull_sheet(
    db: &DbState,
    id: String,
    patch: PullSheetPatch,
) -> CommandResponse<PullSheetDto> {
    debug!(id = %id, "update_pull_sheet command");

    respond(
        async {
            if patch.is_empty() {
                return Err(depot_core::ValidationError::EmptyPatch.into());
            }
            if let Some(ref code) = patch.code {
                validation::validate_name("code", code)?;
            }

            let updated = db.inner().pull_sheets().update(&id, &patch).await?;
            Ok(PullSheetDto::from(updated))
        }
        .await,
    )
}

/// Adds a line to a sheet.
pub async fn add_pull_sheet_item(
    db: &DbState,
    pull_sheet_id: String,
    item: NewPullSheetItem,
) -> CommandResponse<PullSheetItemDto> {
    debug!(
        sheet_id = %pull_sheet_id,
        inventory_item_id = %item.inventory_item_id,
        "add_pull_sheet_item command"
    );

    respond(
        async {
            validation::validate_requested_qty(item.qty_requested)?;
            fetch_open_sheet(db, &pull_sheet_id, "add items").await?;

            let line = db.inner().pull_sheets().add_item(&pull_sheet_id, item).await?;
            Ok(PullSheetItemDto::from(line))
        }
        .await,
    )
}

/// Checks out `qty` units against one line. The checked-out total clamps
/// to the line's requested quantity.
pub async fn checkout_pull_sheet_item(
    db: &DbState,
    pull_sheet_id: String,
    item_id: String,
    qty: i64,
) -> CommandResponse<PullSheetItemDto> {
    debug!(sheet_id = %pull_sheet_id, item_id = %item_id, qty = %qty, "checkout_pull_sheet_item command");

    respond(
        async {
            validation::validate_transition_qty(qty)?;
            fetch_open_sheet(db, &pull_sheet_id, "check out items").await?;

            let line = db
                .inner()
                .pull_sheets()
                .checkout_line(&pull_sheet_id, &item_id, qty)
                .await?;
            Ok(PullSheetItemDto::from(line))
        }
        .await,
    )
}

/// Returns `qty` units against one line. The returned total clamps to what
/// was checked out.
pub async fn return_pull_sheet_item(
    db: &DbState,
    pull_sheet_id: String,
    item_id: String,
    qty: i64,
) -> CommandResponse<PullSheetItemDto> {
    debug!(sheet_id = %pull_sheet_id, item_id = %item_id, qty = %qty, "return_pull_sheet_item command");

    respond(
        async {
            validation::validate_transition_qty(qty)?;
            fetch_open_sheet(db, &pull_sheet_id, "return items").await?;

            let line = db
                .inner()
                .pull_sheets()
                .return_line(&pull_sheet_id, &item_id, qty)
                .await?;
            Ok(PullSheetItemDto::from(line))
        }
        .await,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
