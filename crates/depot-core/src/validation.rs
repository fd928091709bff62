//! # Validation Module
//!
//! Input validation utilities for Depot.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command handler (Rust)                                       │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (barcode)                                      │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an item or sheet name/code.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a barcode.
pub const MAX_BARCODE_LEN: usize = 64;

/// Maximum length of a search query.
pub const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name or pull sheet code.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_name;
///
/// assert!(validate_name("name", "Speaker A").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
/// - Alphanumeric plus hyphens (covers Code128 subsets we print in-house)
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query. Empty is allowed (returns default results);
/// the trimmed query is handed back.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock level supplied by a caller (create or stocktake patch).
/// Stock is never negative.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::QuantityOutOfRange {
            field: "quantity_in_stock".to_string(),
            requirement: "zero or greater",
            value: qty,
        });
    }
    Ok(())
}

/// Validates the quantity of a checkout/return transition. Transitions move
/// at least one unit; zero or negative deltas are caller bugs.
pub fn validate_transition_qty(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::QuantityOutOfRange {
            field: "qty".to_string(),
            requirement: "greater than zero",
            value: qty,
        });
    }
    Ok(())
}

/// Validates the requested quantity on a new pull sheet line.
pub fn validate_requested_qty(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::QuantityOutOfRange {
            field: "qty_requested".to_string(),
            requirement: "greater than zero",
            value: qty,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Speaker A").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("DEP-000123").is_ok());
        assert!(validate_barcode("54490001").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("has spaces").is_err());
        assert!(validate_barcode(&"9".repeat(MAX_BARCODE_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_search_query_trims() {
        assert_eq!(validate_search_query("  coke  ").unwrap(), "coke");
        assert!(validate_search_query(&"q".repeat(MAX_QUERY_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_quantities() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
        assert!(validate_transition_qty(1).is_ok());
        assert!(validate_transition_qty(0).is_err());
        assert!(validate_transition_qty(-4).is_err());
        assert!(validate_requested_qty(5).is_ok());
        assert!(validate_requested_qty(0).is_err());
    }
}
