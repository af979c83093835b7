//! Unified error handling for the applicator.

use auto_coupon_core::{CouponCode, CouponId, LineItemId, SnapshotError};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by a [`CouponStore`](crate::host::CouponStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or answered with a failure.
    #[error("coupon store unavailable: {0}")]
    Unavailable(String),

    /// Requested coupon does not exist.
    #[error("coupon not found: {0}")]
    NotFound(CouponId),

    /// Another coupon already uses this code.
    #[error("coupon code already exists: {0}")]
    Conflict(CouponCode),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Errors raised when mutating a cart or order.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The line item addressed does not exist on the target.
    #[error("line item not found: {0}")]
    LineItemNotFound(LineItemId),

    /// The host refused the change.
    #[error("target rejected change: {0}")]
    Rejected(String),
}

/// Why a coupon's restrictions are not met.
///
/// Reconcilers treat every rejection the same way; the reason is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("coupon is not published")]
    NotPublished,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon usage limit has been reached")]
    UsageLimitReached,

    #[error("minimum spend of {minimum} not met")]
    MinimumSpendNotMet { minimum: Decimal },

    #[error("maximum spend of {maximum} exceeded")]
    MaximumSpendExceeded { maximum: Decimal },

    #[error("coupon is not applicable to the selected items")]
    NotApplicableToItems,

    #[error("coupon is not applicable to excluded items in the cart")]
    ExcludedItems,

    #[error("{0}")]
    Other(String),
}

/// Outcome of an eligibility oracle that did not accept a coupon.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The coupon's restrictions are not met.
    #[error(transparent)]
    Rejected(#[from] CouponRejection),

    /// The oracle itself failed to reach a verdict.
    #[error("eligibility check failed: {0}")]
    Failed(String),
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AutoCouponError {
    /// Coupon store operation failed. Aborts the current pass.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Cart or order mutation failed.
    #[error("target error: {0}")]
    Target(#[from] TargetError),

    /// Snapshot metadata could not be decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoCouponError::from(StoreError::NotFound(CouponId::new(9)));
        assert_eq!(err.to_string(), "store error: coupon not found: 9");

        let err = AutoCouponError::from(TargetError::LineItemNotFound(LineItemId::new(4)));
        assert_eq!(err.to_string(), "target error: line item not found: 4");
    }

    #[test]
    fn test_rejection_is_transparent() {
        let err = CheckError::from(CouponRejection::MinimumSpendNotMet { minimum: dec!(50) });
        assert_eq!(err.to_string(), "minimum spend of 50 not met");

        let err = CheckError::Failed("timeout".to_string());
        assert_eq!(err.to_string(), "eligibility check failed: timeout");
    }
}
