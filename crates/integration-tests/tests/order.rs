//! Integration tests for order reconciliation.

use std::rc::Rc;

use auto_coupon::error::{AutoCouponError, CheckError, StoreError};
use auto_coupon::host::{DiscountTarget, EligibilityOracle, OrderTarget};
use auto_coupon::order::OrderPass;
use auto_coupon_core::{
    COUPON_INFO_KEY, Coupon, DiscountType, LineItemId, ProductId,
};
use auto_coupon_integration_tests::{TestContext, auto_apply, code, coupon};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn save10() -> Coupon {
    auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)))
}

fn add_shirt(order: &mut auto_coupon::memory::MemoryOrder) -> LineItemId {
    order.add_product(ProductId::new(1), "Shirt", 1, dec!(50), dec!(5))
}

// =============================================================================
// Applying
// =============================================================================

#[test]
fn test_eligible_coupon_applied_and_totals_recomputed() {
    let ctx = TestContext::new([save10()]);
    let mut order = ctx.order(false);
    let shirt = add_shirt(&mut order);
    order.add_shipping("Flat rate", dec!(5), Decimal::ZERO);

    let report = ctx.reconcile(&mut order);
    assert_eq!(report.applied, vec![code("SAVE10")]);
    assert!(report.removed.is_empty());

    let line = order.product_line(shirt).unwrap();
    assert_eq!(line.total, dec!(40));
    assert_eq!(line.total_tax, dec!(4));

    let coupon_line = order.coupon_line(&code("SAVE10")).unwrap();
    assert_eq!(coupon_line.discount, dec!(10));
    assert_eq!(coupon_line.discount_tax, dec!(1));
    assert!(coupon_line.meta.contains_key(COUPON_INFO_KEY));

    assert_eq!(order.discount_total(), dec!(10));
    assert_eq!(order.discount_tax(), dec!(1));
    assert_eq!(order.total(), dec!(49));
}

#[test]
fn test_second_pass_changes_nothing() {
    let ctx = TestContext::new([save10()]);
    let mut order = ctx.order(false);
    let shirt = add_shirt(&mut order);

    let first = ctx.reconcile(&mut order);
    let second = ctx.reconcile(&mut order);

    assert!(second.applied.is_empty());
    assert!(second.removed.is_empty());
    assert_eq!(second.allocations, first.allocations);
    assert_eq!(order.coupon_lines().len(), 1);
    assert_eq!(order.product_line(shirt).unwrap().total, dec!(40));
}

#[test]
fn test_coupon_without_flag_left_alone() {
    let ctx = TestContext::new([coupon("MANUAL", DiscountType::FixedCart, dec!(10))]);
    let mut order = ctx.order(false);
    let shirt = add_shirt(&mut order);

    let report = ctx.reconcile(&mut order);
    assert!(report.applied.is_empty());
    assert!(order.applied_coupon_codes().is_empty());
    assert_eq!(order.product_line(shirt).unwrap().total, dec!(50));
}

#[test]
fn test_manually_applied_coupon_kept_and_stacked() {
    let manual = coupon("MANUAL", DiscountType::Percent, dec!(10));
    let ctx = TestContext::new([manual.clone(), save10()]);
    let mut order = ctx.order(false);
    let shirt = order.add_product(ProductId::new(1), "Jacket", 1, dec!(100), dec!(10));
    order.apply_coupon(&manual).unwrap();

    let report = ctx.reconcile(&mut order);
    assert_eq!(report.applied, vec![code("SAVE10")]);
    assert_eq!(
        order.applied_coupon_codes(),
        vec![code("MANUAL"), code("SAVE10")]
    );

    // 10% of 100, then 10 off what remains.
    assert_eq!(report.allocations.coupon(&code("MANUAL")).unwrap().discount, dec!(10));
    assert_eq!(report.allocations.coupon(&code("SAVE10")).unwrap().discount, dec!(10));
    let line = order.product_line(shirt).unwrap();
    assert_eq!(line.total, dec!(80));
    assert_eq!(line.total_tax, dec!(8));
}

// =============================================================================
// Removing
// =============================================================================

#[test]
fn test_ineligible_coupon_removed_in_one_pass() {
    let ctx = TestContext::new([save10()]);
    let mut order = ctx.order(false);
    let shirt = add_shirt(&mut order);
    ctx.reconcile(&mut order);

    ctx.edit_coupon("SAVE10", |c| c.restrictions.minimum_amount = Some(dec!(100)));
    let report = ctx.reconcile(&mut order);

    assert_eq!(report.removed, vec![code("SAVE10")]);
    assert!(order.applied_coupon_codes().is_empty());

    let line = order.product_line(shirt).unwrap();
    assert_eq!(line.total, dec!(50));
    assert_eq!(line.total_tax, dec!(5));
    assert_eq!(order.discount_total(), Decimal::ZERO);
}

#[test]
fn test_removed_coupon_reapplied_when_eligible_again() {
    let ctx = TestContext::new([save10()]);
    let mut order = ctx.order(false);
    add_shirt(&mut order);
    ctx.reconcile(&mut order);

    ctx.edit_coupon("SAVE10", |c| c.restrictions.minimum_amount = Some(dec!(100)));
    ctx.reconcile(&mut order);
    ctx.edit_coupon("SAVE10", |c| c.restrictions.minimum_amount = None);

    let report = ctx.reconcile(&mut order);
    assert_eq!(report.applied, vec![code("SAVE10")]);
    assert_eq!(order.discount_total(), dec!(10));
}

// =============================================================================
// Re-entrancy
// =============================================================================

#[test]
fn test_nested_pass_skipped_while_applying() {
    let ctx = TestContext::new([save10()]);
    let (mut order, log) = ctx.hooked_order(false);
    add_shirt(&mut order);

    let report = ctx.reconcile(&mut order);
    assert_eq!(report.applied, vec![code("SAVE10")]);

    // Applying recalculated the order once; that nested pass was a no-op.
    assert_eq!(log.skipped.get(), 1);
    assert_eq!(log.completed.get(), 0);
    assert_eq!(order.coupon_lines().len(), 1);
}

#[test]
fn test_nested_pass_skipped_while_removing() {
    let ctx = TestContext::new([save10()]);
    let (mut order, log) = ctx.hooked_order(false);
    add_shirt(&mut order);
    ctx.reconcile(&mut order);

    ctx.edit_coupon("SAVE10", |c| c.restrictions.minimum_amount = Some(dec!(100)));
    ctx.reconcile(&mut order);

    assert_eq!(log.skipped.get(), 2);
    assert_eq!(log.completed.get(), 0);
    assert!(order.applied_coupon_codes().is_empty());
}

#[test]
fn test_host_totals_recalculation_runs_full_pass() {
    let ctx = TestContext::new([save10()]);
    let (mut order, log) = ctx.hooked_order(false);
    add_shirt(&mut order);

    // The host-initiated pass applies the coupon; its own nested
    // recalculation is skipped.
    let total = order.calculate_totals();
    assert_eq!(log.completed.get(), 1);
    assert_eq!(log.skipped.get(), 1);
    assert_eq!(total, dec!(44));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_store_failure_aborts_pass() {
    let ctx = TestContext::new([save10()]);
    let mut order = ctx.order(false);
    add_shirt(&mut order);
    ctx.store.set_unavailable(true);

    let result = ctx.plugin.on_order_before_calculate_totals(&mut order);
    assert!(matches!(
        result,
        Err(AutoCouponError::Store(StoreError::Unavailable(_)))
    ));
    assert!(order.applied_coupon_codes().is_empty());

    // The guard was released; the next pass runs normally.
    ctx.store.set_unavailable(false);
    let pass = ctx.plugin.on_order_before_calculate_totals(&mut order).unwrap();
    assert!(matches!(pass, OrderPass::Completed(_)));
    assert_eq!(order.applied_coupon_codes(), vec![code("SAVE10")]);
}

struct FailingOracle;

impl EligibilityOracle for FailingOracle {
    fn is_coupon_valid(
        &self,
        _coupon: &Coupon,
        _target: &dyn DiscountTarget,
    ) -> Result<(), CheckError> {
        Err(CheckError::Failed("validation service down".to_string()))
    }
}

#[test]
fn test_oracle_failure_removes_applied_coupon() {
    let save = save10();
    let ctx = TestContext::with_oracle([save.clone()], Rc::new(FailingOracle));
    let mut order = ctx.order(false);
    let shirt = add_shirt(&mut order);
    order.apply_coupon(&save).unwrap();

    let report = ctx.reconcile(&mut order);
    assert_eq!(report.removed, vec![code("SAVE10")]);
    assert_eq!(order.product_line(shirt).unwrap().total, dec!(50));
}
