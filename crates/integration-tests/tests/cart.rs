//! Integration tests for cart reconciliation.

use std::rc::Rc;

use auto_coupon::error::{CheckError, StoreError};
use auto_coupon::host::{DiscountTarget, EligibilityOracle};
use auto_coupon_core::{Coupon, DiscountType, ProductId};
use auto_coupon_integration_tests::{TestContext, auto_apply, code, coupon};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn shirt_cart(ctx: &TestContext) -> auto_coupon::memory::MemoryCart {
    let mut cart = ctx.cart(false);
    cart.add_product(ProductId::new(1), 1, dec!(50), dec!(5));
    cart
}

// =============================================================================
// Adding Coupons
// =============================================================================

#[test]
fn test_eligible_coupon_added_once() {
    let ctx = TestContext::new([auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)))]);
    let mut cart = shirt_cart(&ctx);

    let first = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert_eq!(first.added, vec![code("SAVE10")]);
    assert_eq!(cart.calculate_totals().unwrap(), dec!(10));

    let second = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert!(second.added.is_empty());
    assert_eq!(cart.applied_coupon_codes(), vec![code("SAVE10")]);
}

#[test]
fn test_coupon_without_flag_left_alone() {
    let ctx = TestContext::new([coupon("MANUAL", DiscountType::FixedCart, dec!(10))]);
    let mut cart = shirt_cart(&ctx);

    let report = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert!(report.added.is_empty());
    assert!(cart.applied_coupon_codes().is_empty());
}

#[test]
fn test_unpublished_auto_apply_coupon_ignored() {
    let mut draft = auto_apply(coupon("DRAFT", DiscountType::Percent, dec!(10)));
    draft.status = auto_coupon_core::CouponStatus::Draft;
    let ctx = TestContext::new([draft]);
    let mut cart = shirt_cart(&ctx);

    assert!(ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap().added.is_empty());
}

#[test]
fn test_ineligible_coupon_not_added() {
    let mut save = auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)));
    save.restrictions.minimum_amount = Some(dec!(100));
    let ctx = TestContext::new([save]);
    let mut cart = shirt_cart(&ctx);

    assert!(ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap().added.is_empty());

    // Becomes eligible once the cart grows.
    cart.add_product(ProductId::new(2), 1, dec!(60), dec!(6));
    assert_eq!(
        ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap().added,
        vec![code("SAVE10")]
    );
}

#[test]
fn test_multiple_coupons_added_in_store_order() {
    let ctx = TestContext::new([
        auto_apply(coupon("FIRST", DiscountType::FixedCart, dec!(5))),
        coupon("MANUAL", DiscountType::FixedCart, dec!(5)),
        auto_apply(coupon("SECOND", DiscountType::Percent, dec!(10))),
    ]);
    let mut cart = shirt_cart(&ctx);

    let report = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert_eq!(report.added, vec![code("FIRST"), code("SECOND")]);
}

// =============================================================================
// Never Removing
// =============================================================================

#[test]
fn test_cart_never_removes_invalid_coupon() {
    let mut save = auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)));
    save.restrictions.minimum_amount = Some(dec!(100));
    let ctx = TestContext::new([save]);
    let mut cart = shirt_cart(&ctx);
    cart.restore_coupon(code("SAVE10"));

    let report = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert!(report.added.is_empty());
    assert_eq!(cart.applied_coupon_codes(), vec![code("SAVE10")]);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_store_failure_propagates() {
    let ctx = TestContext::new([auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)))]);
    let mut cart = shirt_cart(&ctx);
    ctx.store.set_unavailable(true);

    let result = ctx.plugin.on_cart_totals_calculated(&mut cart);
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
    assert!(cart.applied_coupon_codes().is_empty());
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
fn test_oracle_failure_treated_as_invalid() {
    let ctx = TestContext::with_oracle(
        [auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)))],
        Rc::new(FailingOracle),
    );
    let mut cart = shirt_cart(&ctx);

    let report = ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert!(report.added.is_empty());
    assert_eq!(cart.calculate_totals().unwrap(), Decimal::ZERO);
}

#[test]
fn test_hundred_subtotal_scenario() {
    let ctx = TestContext::new([auto_apply(coupon("SAVE10", DiscountType::FixedCart, dec!(10)))]);
    let mut cart = ctx.cart(false);
    cart.add_product(ProductId::new(1), 2, dec!(60), dec!(6));
    cart.add_product(ProductId::new(2), 1, dec!(40), dec!(4));

    ctx.plugin.on_cart_totals_calculated(&mut cart).unwrap();
    assert_eq!(cart.applied_coupon_codes(), vec![code("SAVE10")]);
    assert_eq!(cart.calculate_totals().unwrap(), dec!(10));
}
