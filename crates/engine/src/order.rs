//! Order reconciliation.
//!
//! Runs when the host is about to recalculate an order's totals. Eligible
//! auto-apply coupons are applied, ineligible ones removed, and line totals
//! are then recomputed by the [`Recalculator`].
//!
//! Applying or removing a coupon makes most hosts recalculate the order's
//! totals, which fires the very event this reconciler listens to. A guard
//! flag scoped to the reconciler turns any such nested invocation into a
//! no-op ([`OrderPass::Skipped`]) while a pass is in flight.

use std::cell::Cell;

use auto_coupon_core::CouponCode;
use tracing::{debug, info, instrument, warn};

use crate::eligibility::EligibilityEvaluator;
use crate::error::AutoCouponError;
use crate::host::{CommitDiscountAllocations, OrderTarget};
use crate::recalc::{DiscountAllocations, Recalculator};
use crate::selector::AutoApplySelector;

/// What an order pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReport {
    /// Codes applied during this pass.
    pub applied: Vec<CouponCode>,
    /// Codes removed during this pass.
    pub removed: Vec<CouponCode>,
    /// Line and coupon totals after recalculation.
    pub allocations: DiscountAllocations,
}

/// Outcome of [`OrderReconciler::on_before_calculate_totals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderPass {
    Completed(OrderReport),
    /// Another pass on this reconciler was already running.
    Skipped,
}

impl OrderPass {
    #[must_use]
    pub const fn report(&self) -> Option<&OrderReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped => None,
        }
    }
}

/// Applies and removes auto-apply coupons on orders.
#[derive(Debug)]
pub struct OrderReconciler {
    selector: AutoApplySelector,
    evaluator: EligibilityEvaluator,
    recalculator: Recalculator,
    in_pass: Cell<bool>,
}

/// Clears the in-pass flag when dropped, including on early error returns.
struct PassGuard<'a>(&'a Cell<bool>);

impl<'a> PassGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl OrderReconciler {
    #[must_use]
    pub const fn new(
        selector: AutoApplySelector,
        evaluator: EligibilityEvaluator,
        recalculator: Recalculator,
    ) -> Self {
        Self {
            selector,
            evaluator,
            recalculator,
            in_pass: Cell::new(false),
        }
    }

    /// Reconcile the order's coupons and recompute its line totals.
    ///
    /// Coupon apply/remove failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `AutoCouponError::Store` if coupons cannot be loaded or looked
    /// up, and `AutoCouponError::Target` if recalculated totals cannot be
    /// written. Mutations made before the failure stay on the order.
    #[instrument(skip_all)]
    pub fn on_before_calculate_totals<T>(&self, order: &mut T) -> Result<OrderPass, AutoCouponError>
    where
        T: OrderTarget + CommitDiscountAllocations,
    {
        let Some(_guard) = PassGuard::enter(&self.in_pass) else {
            debug!("Order pass already running, skipping nested invocation");
            return Ok(OrderPass::Skipped);
        };

        let coupons = self.selector.auto_apply_coupons()?;
        let mut report = OrderReport::default();

        for coupon in &coupons {
            let applied = order.is_coupon_applied(&coupon.code);
            if self.evaluator.evaluate(coupon, &*order).is_valid() {
                if applied {
                    continue;
                }
                match order.apply_coupon(coupon) {
                    Ok(true) => {
                        info!(coupon = %coupon.code, "Auto-applied coupon to order");
                        report.applied.push(coupon.code.clone());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(coupon = %coupon.code, error = %e, "Order refused auto-apply coupon");
                    }
                }
            } else if applied {
                match order.remove_coupon(&coupon.code) {
                    Ok(true) => {
                        info!(coupon = %coupon.code, "Removed ineligible auto-apply coupon from order");
                        report.removed.push(coupon.code.clone());
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(coupon = %coupon.code, error = %e, "Order refused coupon removal");
                    }
                }
            }
        }

        report.allocations = self.recalculator.recalculate(order)?;
        Ok(OrderPass::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejects_nested_entry_and_resets() {
        let flag = Cell::new(false);
        {
            let outer = PassGuard::enter(&flag);
            assert!(outer.is_some());
            assert!(PassGuard::enter(&flag).is_none());
            // The failed nested attempt must not clear the outer flag.
            assert!(flag.get());
        }
        assert!(!flag.get());
        assert!(PassGuard::enter(&flag).is_some());
    }
}
