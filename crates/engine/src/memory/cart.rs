//! A shopper's cart.

use std::rc::Rc;

use auto_coupon_core::{CouponCode, LineItemId, Precision, ProductId, ProductLine};
use rust_decimal::Decimal;
use tracing::debug;

use crate::discounts::DiscountAccumulator;
use crate::error::{StoreError, TargetError};
use crate::host::{CartTarget, CouponStore, DiscountTarget};

/// Cart held in memory.
///
/// When built with a store, only codes of published coupons are accepted and
/// [`MemoryCart::calculate_totals`] prices applied coupons from it.
#[derive(Default)]
pub struct MemoryCart {
    lines: Vec<ProductLine>,
    applied: Vec<CouponCode>,
    prices_include_tax: bool,
    precision: Precision,
    store: Option<Rc<dyn CouponStore>>,
    discount_total: Decimal,
}

impl MemoryCart {
    #[must_use]
    pub fn new(prices_include_tax: bool) -> Self {
        Self {
            prices_include_tax,
            ..Self::default()
        }
    }

    /// Validate codes against and price coupons from `store`.
    #[must_use]
    pub fn with_store(mut self, store: Rc<dyn CouponStore>, precision: Precision) -> Self {
        self.store = Some(store);
        self.precision = precision;
        self
    }

    /// Add a product line and return its ID.
    pub fn add_product(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        subtotal: Decimal,
        subtotal_tax: Decimal,
    ) -> LineItemId {
        let id = LineItemId::new(i64::try_from(self.lines.len()).unwrap_or(i64::MAX) + 1);
        self.lines
            .push(ProductLine::new(id, product_id, quantity, subtotal, subtotal_tax));
        id
    }

    /// Record a coupon as already applied, e.g. when restoring a session.
    pub fn restore_coupon(&mut self, code: CouponCode) {
        if !self.is_coupon_applied(&code) {
            self.applied.push(code);
        }
    }

    /// Drop a coupon from the cart, as a shopper would.
    pub fn remove_coupon(&mut self, code: &CouponCode) -> bool {
        let before = self.applied.len();
        self.applied.retain(|c| c != code);
        self.applied.len() != before
    }

    /// Discount granted by applied coupons, as of the last
    /// [`MemoryCart::calculate_totals`].
    #[must_use]
    pub const fn discount_total(&self) -> Decimal {
        self.discount_total
    }

    /// Recompute the cart's coupon discount.
    ///
    /// Without a store, applied coupons cannot be priced and the discount is
    /// zero. Codes that no longer resolve are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a coupon lookup fails.
    pub fn calculate_totals(&mut self) -> Result<Decimal, StoreError> {
        let mut accumulator = DiscountAccumulator::for_target(&*self, self.precision);

        if let Some(store) = &self.store {
            for code in &self.applied {
                match store.find_by_code(code)? {
                    Some(coupon) => {
                        accumulator.apply_coupon(&coupon);
                    }
                    None => debug!(coupon = %code, "Applied coupon no longer exists"),
                }
            }
        }

        self.discount_total = accumulator
            .discounts_by_coupon()
            .iter()
            .map(|(_, amount)| *amount)
            .sum();
        Ok(self.discount_total)
    }
}

impl DiscountTarget for MemoryCart {
    fn applied_coupon_codes(&self) -> Vec<CouponCode> {
        self.applied.clone()
    }

    fn product_lines(&self) -> Vec<ProductLine> {
        self.lines.clone()
    }

    fn prices_include_tax(&self) -> bool {
        self.prices_include_tax
    }
}

impl CartTarget for MemoryCart {
    fn add_coupon(&mut self, code: &CouponCode) -> Result<bool, TargetError> {
        if self.is_coupon_applied(code) {
            return Ok(false);
        }
        if let Some(store) = &self.store {
            let known = store
                .find_by_code(code)
                .map_err(|e| TargetError::Rejected(e.to_string()))?
                .is_some();
            if !known {
                return Err(TargetError::Rejected(format!("coupon {code} does not exist")));
            }
        }
        self.applied.push(code.clone());
        Ok(true)
    }
}

impl std::fmt::Debug for MemoryCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCart")
            .field("lines", &self.lines)
            .field("applied", &self.applied)
            .field("prices_include_tax", &self.prices_include_tax)
            .field("discount_total", &self.discount_total)
            .finish_non_exhaustive()
    }
}
