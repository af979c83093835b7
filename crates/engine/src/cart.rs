//! Cart reconciliation.
//!
//! Runs after the host recalculates cart totals. Eligible auto-apply coupons
//! that are not applied yet get added. Nothing is ever removed here: a coupon
//! that was applied and has since become invalid stays on the cart.

use auto_coupon_core::CouponCode;
use tracing::{info, instrument, warn};

use crate::eligibility::EligibilityEvaluator;
use crate::error::StoreError;
use crate::host::CartTarget;
use crate::selector::AutoApplySelector;

/// What a cart pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartReport {
    /// Codes added during this pass.
    pub added: Vec<CouponCode>,
}

/// Adds eligible auto-apply coupons to carts.
#[derive(Debug, Clone)]
pub struct CartReconciler {
    selector: AutoApplySelector,
    evaluator: EligibilityEvaluator,
}

impl CartReconciler {
    #[must_use]
    pub const fn new(selector: AutoApplySelector, evaluator: EligibilityEvaluator) -> Self {
        Self {
            selector,
            evaluator,
        }
    }

    /// Reconcile the cart's coupons after its totals were recalculated.
    ///
    /// A coupon the cart refuses to take is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if auto-apply coupons cannot be loaded.
    #[instrument(skip_all)]
    pub fn on_totals_calculated<T: CartTarget>(&self, cart: &mut T) -> Result<CartReport, StoreError> {
        let coupons = self.selector.auto_apply_coupons()?;
        let mut report = CartReport::default();

        for coupon in &coupons {
            if !self.evaluator.evaluate(coupon, &*cart).is_valid() {
                continue;
            }
            if cart.is_coupon_applied(&coupon.code) {
                continue;
            }
            match cart.add_coupon(&coupon.code) {
                Ok(true) => {
                    info!(coupon = %coupon.code, "Auto-applied coupon to cart");
                    report.added.push(coupon.code.clone());
                }
                Ok(false) => {}
                Err(e) => warn!(coupon = %coupon.code, error = %e, "Cart refused auto-apply coupon"),
            }
        }

        Ok(report)
    }
}
