//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Agent API errors (in app)                                             │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, field name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Inventory item cannot be found.
    #[error("Inventory item not found: {0}")]
    ItemNotFound(String),

    /// Pull sheet cannot be found.
    #[error("Pull sheet not found: {0}")]
    PullSheetNotFound(String),

    /// Pull sheet line cannot be found.
    #[error("Pull sheet item not found: {0}")]
    PullSheetItemNotFound(String),

    /// A pull sheet in this status does not allow the requested transition.
    ///
    /// ## When This Occurs
    /// - Adding a line to a finalized sheet
    /// - Checking gear out against a draft sheet
    #[error("Pull sheet {sheet_id} is {status}, cannot {operation}")]
    InvalidSheetStatus {
        sheet_id: String,
        status: String,
        operation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic or database work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A field exceeds its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A field has an invalid format.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A quantity is out of range.
    #[error("{field} must be {requirement} (got {value})")]
    QuantityOutOfRange {
        field: String,
        requirement: &'static str,
        value: i64,
    },

    /// A patch with no fields set.
    #[error("update contains no fields")]
    EmptyPatch,
}
