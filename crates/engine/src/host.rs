//! Interfaces the host platform implements.
//!
//! The applicator never touches host internals directly. Everything it reads
//! or writes goes through these traits, and the in-memory adapter in
//! [`crate::memory`] implements all of them for tests and the CLI.
//!
//! All methods take `&self` on the store and `&mut self` on targets. The
//! host runs one request at a time per worker, so adapters are free to use
//! `RefCell` internally.

use auto_coupon_core::{
    Coupon, CouponCode, CouponId, CouponLine, CouponStatus, LineItemId, ProductLine,
};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{CheckError, StoreError, TargetError};
use crate::recalc::DiscountAllocations;

// =============================================================================
// Coupon Store
// =============================================================================

/// Filter for [`CouponStore::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponQuery {
    /// Only coupons with this status.
    pub status: Option<CouponStatus>,
    /// Only coupons whose metadata under this key is truthy.
    pub flag: Option<String>,
}

impl CouponQuery {
    /// Published coupons only.
    #[must_use]
    pub const fn published() -> Self {
        Self {
            status: Some(CouponStatus::Publish),
            flag: None,
        }
    }

    /// Additionally require a truthy metadata flag.
    #[must_use]
    pub fn with_flag(mut self, key: impl Into<String>) -> Self {
        self.flag = Some(key.into());
        self
    }

    /// Whether `coupon` passes this filter.
    #[must_use]
    pub fn matches(&self, coupon: &Coupon) -> bool {
        self.status.is_none_or(|status| coupon.status == status)
            && self.flag.as_deref().is_none_or(|key| coupon.meta_flag(key))
    }
}

/// Persisted coupons.
pub trait CouponStore {
    /// IDs of all coupons matching `query`, in store order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    fn query(&self, query: &CouponQuery) -> Result<Vec<CouponId>, StoreError>;

    /// Fetch a coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    fn get(&self, id: CouponId) -> Result<Option<Coupon>, StoreError>;

    /// Fetch the published coupon with this code.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, StoreError>;

    /// Persist a new coupon and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the coupon cannot be written.
    fn create(&self, coupon: Coupon) -> Result<CouponId, StoreError>;

    /// Overwrite an existing coupon.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the coupon has no ID or is unknown.
    fn update(&self, coupon: &Coupon) -> Result<(), StoreError>;

    /// Delete a coupon permanently.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the coupon is unknown.
    fn delete(&self, id: CouponId) -> Result<(), StoreError>;

    /// Set a metadata value on a coupon.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the coupon is unknown.
    fn update_meta(&self, id: CouponId, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove a metadata value from a coupon. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the coupon is unknown.
    fn delete_meta(&self, id: CouponId, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// Targets
// =============================================================================

/// Read-only view of a cart or order, as needed to evaluate and allocate
/// discounts.
pub trait DiscountTarget {
    /// Codes of coupons currently applied, in application order.
    fn applied_coupon_codes(&self) -> Vec<CouponCode>;

    /// Product lines that coupons can discount.
    fn product_lines(&self) -> Vec<ProductLine>;

    /// Whether entered prices already include tax.
    fn prices_include_tax(&self) -> bool;

    /// Whether a coupon with this code is applied.
    fn is_coupon_applied(&self, code: &CouponCode) -> bool {
        self.applied_coupon_codes().iter().any(|c| c == code)
    }

    /// Pre-discount items subtotal, tax-inclusive when prices include tax.
    fn items_subtotal(&self) -> Decimal {
        let include_tax = self.prices_include_tax();
        self.product_lines()
            .iter()
            .map(|line| {
                if include_tax {
                    line.subtotal + line.subtotal_tax
                } else {
                    line.subtotal
                }
            })
            .sum()
    }
}

/// A shopper's cart.
pub trait CartTarget: DiscountTarget {
    /// Add a coupon by code. Returns `false` if it was already applied.
    ///
    /// # Errors
    ///
    /// Returns `TargetError` if the host refuses the coupon.
    fn add_coupon(&mut self, code: &CouponCode) -> Result<bool, TargetError>;
}

/// An order being edited.
pub trait OrderTarget: DiscountTarget {
    /// Applied coupon lines, in line order.
    fn coupon_lines(&self) -> Vec<CouponLine>;

    /// Apply a coupon, recording a snapshot line. Returns `false` if it was
    /// already applied.
    ///
    /// # Errors
    ///
    /// Returns `TargetError` if the host refuses the coupon.
    fn apply_coupon(&mut self, coupon: &Coupon) -> Result<bool, TargetError>;

    /// Remove a coupon by code. Returns `false` if it was not applied.
    ///
    /// # Errors
    ///
    /// Returns `TargetError` if the host refuses the change.
    fn remove_coupon(&mut self, code: &CouponCode) -> Result<bool, TargetError>;

    /// Overwrite a product line's total and total tax.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::LineItemNotFound` for unknown product lines.
    fn set_item_totals(
        &mut self,
        id: LineItemId,
        total: Decimal,
        total_tax: Decimal,
    ) -> Result<(), TargetError>;
}

/// Capability to write computed discount allocations onto a target.
///
/// Hosts typically keep these fields behind their full-recalculation entry
/// point; an adapter implements this trait with whatever supported write path
/// the host offers, so the applicator never re-enters that entry point.
pub trait CommitDiscountAllocations {
    /// Store per-item totals and per-coupon discount amounts.
    ///
    /// # Errors
    ///
    /// Returns `TargetError` if a referenced line does not exist.
    fn commit_discount_allocations(
        &mut self,
        allocations: &DiscountAllocations,
    ) -> Result<(), TargetError>;
}

// =============================================================================
// Eligibility Oracle
// =============================================================================

/// The host's coupon validation logic.
pub trait EligibilityOracle {
    /// Check a coupon's restrictions against a target.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::Rejected` with the reason the coupon is invalid,
    /// or `CheckError::Failed` if no verdict could be reached.
    fn is_coupon_valid(&self, coupon: &Coupon, target: &dyn DiscountTarget)
    -> Result<(), CheckError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auto_coupon_core::{DiscountType, ProductId};
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    struct Lines(Vec<ProductLine>, bool);

    impl DiscountTarget for Lines {
        fn applied_coupon_codes(&self) -> Vec<CouponCode> {
            vec![CouponCode::parse("A").unwrap()]
        }

        fn product_lines(&self) -> Vec<ProductLine> {
            self.0.clone()
        }

        fn prices_include_tax(&self) -> bool {
            self.1
        }
    }

    #[test]
    fn test_query_matches() {
        let mut coupon = Coupon::new(
            CouponCode::parse("A").unwrap(),
            DiscountType::Percent,
            dec!(5),
        );
        let query = CouponQuery::published().with_flag("_auto");
        assert!(!query.matches(&coupon));

        coupon.set_meta("_auto", json!("yes"));
        assert!(query.matches(&coupon));

        coupon.status = CouponStatus::Draft;
        assert!(!query.matches(&coupon));
        assert!(CouponQuery::default().matches(&coupon));
    }

    #[test]
    fn test_default_target_helpers() {
        let line = ProductLine::new(
            LineItemId::new(1),
            ProductId::new(1),
            1,
            dec!(50),
            dec!(5),
        );
        let exclusive = Lines(vec![line.clone()], false);
        assert_eq!(exclusive.items_subtotal(), dec!(50));
        assert!(exclusive.is_coupon_applied(&CouponCode::parse("A").unwrap()));
        assert!(!exclusive.is_coupon_applied(&CouponCode::parse("B").unwrap()));

        let inclusive = Lines(vec![line], true);
        assert_eq!(inclusive.items_subtotal(), dec!(55));
    }
}
