//! # Stock Arithmetic
//!
//! Clamped quantity math for checkout/return transitions.
//!
//! ## Why Arithmetic, Not Assignment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quantity Transition Strategy                         │
//! │                                                                         │
//! │  ❌ WRONG: caller computes the new total from a stale read             │
//! │     item.quantity = 6   (what if someone else checked out meanwhile?)  │
//! │                                                                         │
//! │  ✅ CORRECT: transition is a delta applied to the current value        │
//! │     checkout(current, 4) = max(0, current - 4)                         │
//! │                                                                         │
//! │  Two warehouse terminals can check out concurrently and the            │
//! │  committed results compose instead of racing on a snapshot.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions are pure and total: any `i64` input produces a defined,
//! in-range result. Negative transition quantities are rejected upstream by
//! [`crate::validation::validate_transition_qty`].

use crate::types::PullSheetItemStatus;

// =============================================================================
// Warehouse Stock
// =============================================================================

/// Stock remaining after checking out `qty` units. Clamps at zero: checking
/// out more than is on the shelf empties the shelf, it does not go negative.
///
/// ## Example
/// ```rust
/// use depot_core::stock::checkout_stock;
///
/// assert_eq!(checkout_stock(10, 4), 6);
/// assert_eq!(checkout_stock(3, 99), 0);
/// ```
#[inline]
pub fn checkout_stock(current: i64, qty: i64) -> i64 {
    (current - qty).max(0)
}

/// Stock after returning `qty` units.
///
/// Returns are not clamped against an original level: gear can legitimately
/// come back to a shelf that was adjusted down while it was out.
#[inline]
pub fn return_stock(current: i64, qty: i64) -> i64 {
    current + qty
}

// =============================================================================
// Pull Sheet Lines
// =============================================================================

/// New checked-out total for a pull sheet line.
///
/// Clamps so the line never has more checked out than was requested:
/// `min(requested, already_out + qty)`.
#[inline]
pub fn line_checkout(requested: i64, already_out: i64, qty: i64) -> i64 {
    (already_out + qty).min(requested)
}

/// New returned total for a pull sheet line.
///
/// Clamps so the line never has more returned than went out:
/// `min(checked_out, already_returned + qty)`.
#[inline]
pub fn line_return(checked_out: i64, already_returned: i64, qty: i64) -> i64 {
    (already_returned + qty).min(checked_out)
}

/// Derives a line's fulfillment status from its quantities.
///
/// - Nothing out yet → `Pending`
/// - Everything that went out is back → `Returned`
/// - Otherwise → `CheckedOut` (covers partial picks and partial returns)
pub fn line_status(checked_out: i64, returned: i64) -> PullSheetItemStatus {
    if checked_out <= 0 {
        PullSheetItemStatus::Pending
    } else if returned >= checked_out {
        PullSheetItemStatus::Returned
    } else {
        PullSheetItemStatus::CheckedOut
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_clamps_at_zero() {
        assert_eq!(checkout_stock(10, 4), 6);
        assert_eq!(checkout_stock(10, 10), 0);
        assert_eq!(checkout_stock(10, 11), 0);
        assert_eq!(checkout_stock(0, 5), 0);
    }

    #[test]
    fn test_checkout_return_round_trip() {
        // checkout(k) then return(k) restores the starting level for k <= S
        let start = 10;
        for k in 0..=start {
            let after_out = checkout_stock(start, k);
            assert_eq!(return_stock(after_out, k), start);
        }
    }

    #[test]
    fn test_line_checkout_never_exceeds_requested() {
        assert_eq!(line_checkout(5, 0, 3), 3);
        assert_eq!(line_checkout(5, 3, 2), 5);
        assert_eq!(line_checkout(5, 3, 99), 5);
        assert_eq!(line_checkout(5, 5, 1), 5);
    }

    #[test]
    fn test_line_return_never_exceeds_checked_out() {
        assert_eq!(line_return(3, 0, 2), 2);
        assert_eq!(line_return(3, 2, 1), 3);
        assert_eq!(line_return(3, 2, 99), 3);
    }

    #[test]
    fn test_line_status_derivation() {
        assert_eq!(line_status(0, 0), PullSheetItemStatus::Pending);
        assert_eq!(line_status(3, 0), PullSheetItemStatus::CheckedOut);
        assert_eq!(line_status(3, 1), PullSheetItemStatus::CheckedOut);
        assert_eq!(line_status(3, 3), PullSheetItemStatus::Returned);
    }
}
