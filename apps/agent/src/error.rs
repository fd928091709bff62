//! # API Error Type & Response Envelope
//!
//! Unified error type and the uniform response envelope for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Depot                                  │
//! │                                                                         │
//! │  UI layer                     Agent                                     │
//! │  ────────                     ─────                                     │
//! │                                                                         │
//! │  invoke('checkout_item')                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler                                                 │  │
//! │  │         │                                                        │  │
//! │  │  Database error? ──── DbError::NotFound ─────────┐               │  │
//! │  │         │                                        ▼               │  │
//! │  │  Validation error? ── ValidationError ───────── ApiError         │  │
//! │  │         │                                        │               │  │
//! │  │  Success ──────────┐                             │               │  │
//! │  └────────────────────┼─────────────────────────────┼───────────────┘  │
//! │                       ▼                             ▼                  │
//! │        { success: true, data }      { success: false, error, code }    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers never panic and never let a storage fault escape: everything
//! funnels into the envelope, with the raw error logged server-side and a
//! displayable message in `error`.

use serde::Serialize;

use depot_core::{CoreError, ValidationError};
use depot_db::DbError;
use depot_sync::SyncError;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error codes for programmatic handling in the UI.
///
/// ## Usage in Frontend
/// ```typescript
/// const res = await invoke('get_item', { id });
/// if (!res.success) {
///   switch (res.code) {
///     case 'NOT_FOUND': showNotification('Item not found'); break;
///     case 'VALIDATION_ERROR': showForm(res.error); break;
///     default: showError('An error occurred');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found.
    NotFound,

    /// Input validation failed.
    ValidationError,

    /// Embedded store operation failed.
    DatabaseError,

    /// Operation conflicts with current state (duplicate barcode,
    /// finalized sheet, sync already running).
    Conflict,

    /// Sync-layer error.
    SyncError,

    /// Internal error.
    Internal,
}

// =============================================================================
// API Error
// =============================================================================

/// API error carried inside a failed response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts store errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Serialization(e) => {
                tracing::error!("Snapshot serialization failed: {}", e);
                ApiError::new(ErrorCode::Internal, "Change capture failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Inventory item", &id),
            CoreError::PullSheetNotFound(id) => ApiError::not_found("Pull sheet", &id),
            CoreError::PullSheetItemNotFound(id) => ApiError::not_found("Pull sheet item", &id),
            CoreError::InvalidSheetStatus { .. } => ApiError::conflict(err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts sync errors to API errors.
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::SyncInProgress => ApiError::conflict(err.to_string()),
            SyncError::Db(db) => ApiError::from(db),
            other => {
                tracing::error!("Sync error: {}", other);
                ApiError::new(ErrorCode::SyncError, other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Response Envelope
// =============================================================================

/// The uniform result shape every command returns.
///
/// Exactly one of `data` / `error` is set:
/// ```json
/// { "success": true,  "data": { ... } }
/// { "success": false, "error": "Inventory item not found: x", "code": "NOT_FOUND" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl<T> CommandResponse<T> {
    /// A successful response carrying data.
    pub fn ok(data: T) -> Self {
        CommandResponse {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    /// A failed response carrying the error message and code.
    pub fn err(error: ApiError) -> Self {
        CommandResponse {
            success: false,
            data: None,
            error: Some(error.message),
            code: Some(error.code),
        }
    }
}

/// Folds a handler result into the envelope.
///
/// This is the single funnel through which every command returns; it is
/// why a storage fault can never propagate uncaught to the caller.
pub fn respond<T>(result: Result<T, ApiError>) -> CommandResponse<T> {
    match result {
        Ok(data) => CommandResponse::ok(data),
        Err(error) => {
            tracing::debug!(code = ?error.code, message = %error.message, "Command failed");
            CommandResponse::err(error)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
