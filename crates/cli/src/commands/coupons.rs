//! List a scenario's coupons the way the admin coupon list shows them.

use std::path::Path;
use std::rc::Rc;

use auto_coupon::admin::CODE_COLUMN;
use auto_coupon::host::CouponStore;
use auto_coupon::restrictions::RestrictionOracle;
use auto_coupon::selector::AutoApplySelector;
use auto_coupon::{AutoCoupon, AutoCouponConfig};
use tracing::info;

use super::CommandError;
use crate::scenario::Scenario;

/// List the coupons of the scenario at `path`.
///
/// # Errors
///
/// Returns `CommandError` if the scenario cannot be loaded.
pub fn run(path: &Path, config: AutoCouponConfig) -> Result<(), CommandError> {
    let scenario = Scenario::load(path)?;
    let store = Rc::new(scenario.coupon_store(&config.meta_key)?);
    let selector = AutoApplySelector::new(
        Rc::clone(&store) as Rc<dyn CouponStore>,
        config.meta_key.as_str(),
    );
    let plugin = AutoCoupon::new(
        config,
        Rc::clone(&store) as Rc<dyn CouponStore>,
        Rc::new(RestrictionOracle::new()),
    );

    for coupon in store.coupons() {
        let Some(id) = coupon.id else {
            continue;
        };
        let marker = plugin.coupon_list_column(CODE_COLUMN, id)?;
        let field = plugin.coupon_options_field(&coupon);
        info!(
            coupon_id = %id,
            code = %format!("{}{marker}", coupon.code),
            status = %coupon.status,
            discount_type = %coupon.discount_type,
            amount = %coupon.amount,
            auto_apply = field.is_checked(),
            "Coupon"
        );
    }

    let auto_apply = selector.auto_apply_coupons()?;
    info!(
        total = store.len(),
        auto_apply = auto_apply.len(),
        "Listed coupons"
    );
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
