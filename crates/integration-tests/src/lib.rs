//! Integration tests for Auto Coupon.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p auto-coupon-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart` - Cart reconciliation
//! - `order` - Order reconciliation, re-entrancy and error handling
//! - `deleted_coupons` - Recalculation of orders whose coupons were deleted
//! - `admin` - Hook registration, admin options and cart display
//!
//! Every test runs against the in-memory host adapter; [`TestContext`] wires
//! it together.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::cell::Cell;
use std::rc::Rc;

use auto_coupon::config::DEFAULT_META_KEY;
use auto_coupon::host::{CouponStore, EligibilityOracle};
use auto_coupon::memory::{MemoryCart, MemoryCouponStore, MemoryOrder};
use auto_coupon::order::OrderPass;
use auto_coupon::restrictions::RestrictionOracle;
use auto_coupon::{AutoCoupon, AutoCouponConfig};
use auto_coupon_core::{Coupon, CouponCode, DiscountType, OrderId};
use rust_decimal::Decimal;
use serde_json::Value;

/// Meta key the default configuration flags coupons with.
pub const META_KEY: &str = DEFAULT_META_KEY;

#[must_use]
pub fn code(s: &str) -> CouponCode {
    CouponCode::parse(s).unwrap()
}

/// A published, unrestricted coupon.
#[must_use]
pub fn coupon(code_str: &str, discount_type: DiscountType, amount: Decimal) -> Coupon {
    Coupon::new(code(code_str), discount_type, amount)
}

/// Flag `coupon` for automatic application.
#[must_use]
pub fn auto_apply(mut coupon: Coupon) -> Coupon {
    coupon.set_meta(META_KEY, Value::Bool(true));
    coupon
}

/// What nested order passes, fired by the order's own totals recalculation,
/// amounted to.
#[derive(Debug, Default)]
pub struct HookLog {
    pub completed: Cell<usize>,
    pub skipped: Cell<usize>,
    pub failed: Cell<usize>,
}

/// A store, an applicator over it, and builders for carts and orders.
pub struct TestContext {
    pub store: Rc<MemoryCouponStore>,
    pub plugin: Rc<AutoCoupon>,
}

impl TestContext {
    /// Default configuration and the restriction oracle.
    #[must_use]
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self::with_oracle(coupons, Rc::new(RestrictionOracle::new()))
    }

    #[must_use]
    pub fn with_oracle(
        coupons: impl IntoIterator<Item = Coupon>,
        oracle: Rc<dyn EligibilityOracle>,
    ) -> Self {
        Self::with_config(AutoCouponConfig::default(), coupons, oracle)
    }

    #[must_use]
    pub fn with_config(
        config: AutoCouponConfig,
        coupons: impl IntoIterator<Item = Coupon>,
        oracle: Rc<dyn EligibilityOracle>,
    ) -> Self {
        let store = Rc::new(MemoryCouponStore::with_coupons(coupons).unwrap());
        let plugin = Rc::new(AutoCoupon::new(config, Rc::clone(&store) as Rc<dyn CouponStore>, oracle));
        Self { store, plugin }
    }

    /// A store-backed cart.
    #[must_use]
    pub fn cart(&self, prices_include_tax: bool) -> MemoryCart {
        MemoryCart::new(prices_include_tax).with_store(
            Rc::clone(&self.store) as Rc<dyn CouponStore>,
            self.plugin.config().precision,
        )
    }

    /// An order with no before-totals hook.
    #[must_use]
    pub fn order(&self, prices_include_tax: bool) -> MemoryOrder {
        MemoryOrder::new(OrderId::new(1), prices_include_tax)
    }

    /// An order whose totals recalculation runs the order handler, as a host
    /// would.
    #[must_use]
    pub fn hooked_order(&self, prices_include_tax: bool) -> (MemoryOrder, Rc<HookLog>) {
        let log = Rc::new(HookLog::default());
        let hook_log = Rc::clone(&log);
        let plugin = Rc::clone(&self.plugin);

        let order = self
            .order(prices_include_tax)
            .with_before_totals_hook(Rc::new(move |order: &mut MemoryOrder| {
                let counter = match plugin.on_order_before_calculate_totals(order) {
                    Ok(OrderPass::Completed(_)) => &hook_log.completed,
                    Ok(OrderPass::Skipped) => &hook_log.skipped,
                    Err(_) => &hook_log.failed,
                };
                counter.set(counter.get() + 1);
            }));
        (order, log)
    }

    /// Run one order pass and return its report.
    pub fn reconcile(&self, order: &mut MemoryOrder) -> auto_coupon::order::OrderReport {
        match self.plugin.on_order_before_calculate_totals(order).unwrap() {
            OrderPass::Completed(report) => report,
            OrderPass::Skipped => panic!("top-level order pass was skipped"),
        }
    }

    /// Update a stored coupon in place.
    pub fn edit_coupon(&self, code_str: &str, edit: impl FnOnce(&mut Coupon)) {
        let mut coupon = self.store.find_by_code(&code(code_str)).unwrap().unwrap();
        edit(&mut coupon);
        self.store.update(&coupon).unwrap();
    }
}
