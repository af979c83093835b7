//! Run the cart and order handlers against a scenario.
//!
//! The order is wired like a real host: applying or removing a coupon
//! recalculates its totals, which fires the order handler again. Those nested
//! passes show up as skipped in debug logs.

use std::path::Path;
use std::rc::Rc;

use auto_coupon::hooks::Hook;
use auto_coupon::host::{CouponStore, DiscountTarget};
use auto_coupon::memory::{MemoryCouponStore, MemoryOrder};
use auto_coupon::order::OrderPass;
use auto_coupon::restrictions::RestrictionOracle;
use auto_coupon::{AutoCoupon, AutoCouponConfig};
use auto_coupon_core::{CouponCode, LineItem, Precision};
use tracing::{debug, info, warn};

use super::CommandError;
use crate::scenario::{Scenario, ScenarioCart, ScenarioOrder};

/// Simulate the scenario at `path`.
///
/// # Errors
///
/// Returns `CommandError` if the scenario cannot be loaded or a handler fails.
pub fn run(path: &Path, config: AutoCouponConfig) -> Result<(), CommandError> {
    let scenario = Scenario::load(path)?;
    info!(path = %path.display(), coupons = scenario.coupons.len(), "Loaded scenario");

    let store = Rc::new(scenario.coupon_store(&config.meta_key)?);
    let oracle = scenario
        .now
        .map_or_else(RestrictionOracle::new, RestrictionOracle::at);
    let precision = config.precision;
    let plugin = Rc::new(AutoCoupon::new(
        config,
        Rc::clone(&store) as Rc<dyn CouponStore>,
        Rc::new(oracle),
    ));

    let mut hooks: Vec<Hook> = Vec::new();
    if plugin.register(&mut hooks) == 0 {
        warn!("Coupons are disabled, nothing to simulate");
        return Ok(());
    }

    if let Some(cart) = &scenario.cart {
        simulate_cart(&plugin, cart, scenario.prices_include_tax, &store, precision)?;
    }
    if let Some(order) = &scenario.order {
        simulate_order(&plugin, order, scenario.prices_include_tax)?;
    }
    if scenario.cart.is_none() && scenario.order.is_none() {
        warn!("Scenario has neither a cart nor an order");
    }
    Ok(())
}

fn codes(codes: &[CouponCode]) -> String {
    codes
        .iter()
        .map(CouponCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn simulate_cart(
    plugin: &AutoCoupon,
    cart_def: &ScenarioCart,
    prices_include_tax: bool,
    store: &Rc<MemoryCouponStore>,
    precision: Precision,
) -> Result<(), CommandError> {
    let mut cart = cart_def.build(prices_include_tax, Rc::clone(store) as Rc<dyn CouponStore>, precision);
    let before = cart.calculate_totals()?;

    let report = plugin.on_cart_totals_calculated(&mut cart)?;
    let after = cart.calculate_totals()?;

    info!(
        added = %codes(&report.added),
        applied = %codes(&cart.applied_coupon_codes()),
        discount_before = %before,
        discount = %after,
        "Cart reconciled"
    );

    for code in cart.applied_coupon_codes() {
        let Some(coupon) = store.find_by_code(&code)? else {
            continue;
        };
        let amount = format!("-{}", coupon.amount);
        let label = plugin.cart_coupon_label(&coupon, format!("Coupon: {code}"));
        let html = plugin.cart_coupon_html(&coupon, format!("{amount} [Remove]"), amount);
        info!(coupon = %code, %label, %html, "Cart coupon row");
    }
    Ok(())
}

fn simulate_order(
    plugin: &Rc<AutoCoupon>,
    order_def: &ScenarioOrder,
    prices_include_tax: bool,
) -> Result<(), CommandError> {
    let hook_plugin = Rc::clone(plugin);
    let mut order = order_def
        .build(prices_include_tax)
        .with_before_totals_hook(Rc::new(move |order: &mut MemoryOrder| {
            match hook_plugin.on_order_before_calculate_totals(order) {
                Ok(OrderPass::Skipped) => debug!("Nested order pass skipped"),
                Ok(OrderPass::Completed(_)) => {}
                Err(e) => warn!(error = %e, "Order pass failed"),
            }
        }));
    let before = order.total();

    let pass = plugin.on_order_before_calculate_totals(&mut order)?;
    if let Some(report) = pass.report() {
        info!(
            applied = %codes(&report.applied),
            removed = %codes(&report.removed),
            discount = %report.allocations.discount_total(),
            discount_tax = %report.allocations.discount_tax(),
            "Order reconciled"
        );
    }

    for item in order.items() {
        match item {
            LineItem::Product(line) => info!(
                line = %line.id,
                name = %line.name,
                subtotal = %line.subtotal,
                subtotal_tax = %line.subtotal_tax,
                total = %line.total,
                total_tax = %line.total_tax,
                "Product line"
            ),
            LineItem::Coupon(line) => info!(
                coupon = %line.code,
                discount = %line.discount,
                discount_tax = %line.discount_tax,
                "Coupon line"
            ),
            LineItem::Shipping(_) | LineItem::Fee(_) => {}
        }
    }
    info!(order_id = %order.id(), total_before = %before, total = %order.total(), "Order totals");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn demo_scenario() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/scenario.yaml")
    }

    #[test]
    fn test_runs_demo_scenario() {
        run(&demo_scenario(), AutoCouponConfig::default()).unwrap();
    }

    #[test]
    fn test_missing_scenario_file() {
        let result = run(Path::new("does/not/exist.yaml"), AutoCouponConfig::default());
        assert!(matches!(result, Err(CommandError::NotFound(_))));
    }
}
