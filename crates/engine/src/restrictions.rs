//! A reference eligibility oracle that enforces a coupon's own restrictions.
//!
//! Hosts usually plug in their own validation; this one backs the in-memory
//! adapter and the CLI.

use auto_coupon_core::{Coupon, DiscountType, ProductLine};
use chrono::{DateTime, Utc};

use crate::error::{CheckError, CouponRejection};
use crate::host::{DiscountTarget, EligibilityOracle};

/// Checks [`CouponRestrictions`](auto_coupon_core::CouponRestrictions) in a
/// fixed order and reports the first one that fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestrictionOracle {
    /// Evaluation time; `None` means the wall clock.
    now: Option<DateTime<Utc>>,
}

impl RestrictionOracle {
    #[must_use]
    pub const fn new() -> Self {
        Self { now: None }
    }

    /// Evaluate expiry against a fixed instant.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn check(&self, coupon: &Coupon, target: &dyn DiscountTarget) -> Result<(), CouponRejection> {
        let rules = &coupon.restrictions;

        if !coupon.status.is_published() && !coupon.is_virtual {
            return Err(CouponRejection::NotPublished);
        }
        if rules.expires_at.is_some_and(|expires| expires <= self.now()) {
            return Err(CouponRejection::Expired);
        }
        if rules
            .usage_limit
            .is_some_and(|limit| rules.usage_count >= limit)
        {
            return Err(CouponRejection::UsageLimitReached);
        }

        let subtotal = target.items_subtotal();
        if let Some(minimum) = rules.minimum_amount.filter(|min| *min > subtotal) {
            return Err(CouponRejection::MinimumSpendNotMet { minimum });
        }
        if let Some(maximum) = rules.maximum_amount.filter(|max| *max < subtotal) {
            return Err(CouponRejection::MaximumSpendExceeded { maximum });
        }

        let lines = target.product_lines();
        let eligible = |line: &ProductLine| {
            (rules.product_ids.is_empty() || rules.product_ids.contains(&line.product_id))
                && !rules.excluded_product_ids.contains(&line.product_id)
        };
        let has_eligible = lines.iter().any(eligible);
        if (!rules.product_ids.is_empty() || coupon.discount_type == DiscountType::FixedProduct)
            && !has_eligible
        {
            return Err(CouponRejection::NotApplicableToItems);
        }
        if coupon.discount_type.is_cart_wide()
            && lines
                .iter()
                .any(|line| rules.excluded_product_ids.contains(&line.product_id))
        {
            return Err(CouponRejection::ExcludedItems);
        }

        Ok(())
    }
}

impl EligibilityOracle for RestrictionOracle {
    fn is_coupon_valid(
        &self,
        coupon: &Coupon,
        target: &dyn DiscountTarget,
    ) -> Result<(), CheckError> {
        self.check(coupon, target).map_err(CheckError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auto_coupon_core::{CouponCode, CouponStatus, LineItemId, ProductId};
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    struct Cart(Vec<ProductLine>);

    impl DiscountTarget for Cart {
        fn applied_coupon_codes(&self) -> Vec<CouponCode> {
            Vec::new()
        }

        fn product_lines(&self) -> Vec<ProductLine> {
            self.0.clone()
        }

        fn prices_include_tax(&self) -> bool {
            false
        }
    }

    fn cart(lines: &[(i64, Decimal)]) -> Cart {
        Cart(
            lines
                .iter()
                .enumerate()
                .map(|(i, (product, price))| {
                    ProductLine::new(
                        LineItemId::new(i64::try_from(i).unwrap() + 1),
                        ProductId::new(*product),
                        1,
                        *price,
                        Decimal::ZERO,
                    )
                })
                .collect(),
        )
    }

    fn coupon(discount_type: DiscountType) -> Coupon {
        Coupon::new(CouponCode::parse("SAVE10").unwrap(), discount_type, dec!(10))
    }

    fn reject(oracle: &RestrictionOracle, coupon: &Coupon, target: &Cart) -> CouponRejection {
        match oracle.is_coupon_valid(coupon, target) {
            Err(CheckError::Rejected(reason)) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_unrestricted_coupon_is_valid() {
        let oracle = RestrictionOracle::new();
        assert!(oracle.is_coupon_valid(&coupon(DiscountType::FixedCart), &cart(&[(1, dec!(50))])).is_ok());
    }

    #[test]
    fn test_status_and_virtual() {
        let oracle = RestrictionOracle::new();
        let target = cart(&[(1, dec!(50))]);
        let mut c = coupon(DiscountType::FixedCart);
        c.status = CouponStatus::Draft;
        assert_eq!(reject(&oracle, &c, &target), CouponRejection::NotPublished);

        c.is_virtual = true;
        assert!(oracle.is_coupon_valid(&c, &target).is_ok());
    }

    #[test]
    fn test_expiry_and_usage() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let oracle = RestrictionOracle::at(now);
        let target = cart(&[(1, dec!(50))]);

        let mut c = coupon(DiscountType::Percent);
        c.restrictions.expires_at = Some(now);
        assert_eq!(reject(&oracle, &c, &target), CouponRejection::Expired);
        c.restrictions.expires_at = Some(now + Duration::days(1));
        assert!(oracle.is_coupon_valid(&c, &target).is_ok());

        c.restrictions.usage_limit = Some(3);
        c.restrictions.usage_count = 3;
        assert_eq!(reject(&oracle, &c, &target), CouponRejection::UsageLimitReached);
    }

    #[test]
    fn test_spend_bounds() {
        let oracle = RestrictionOracle::new();
        let target = cart(&[(1, dec!(30)), (2, dec!(20))]);

        let mut c = coupon(DiscountType::FixedCart);
        c.restrictions.minimum_amount = Some(dec!(60));
        assert_eq!(
            reject(&oracle, &c, &target),
            CouponRejection::MinimumSpendNotMet { minimum: dec!(60) }
        );

        c.restrictions.minimum_amount = Some(dec!(50));
        assert!(oracle.is_coupon_valid(&c, &target).is_ok());

        c.restrictions.maximum_amount = Some(dec!(40));
        assert_eq!(
            reject(&oracle, &c, &target),
            CouponRejection::MaximumSpendExceeded { maximum: dec!(40) }
        );
    }

    #[test]
    fn test_product_rules() {
        let oracle = RestrictionOracle::new();
        let target = cart(&[(1, dec!(30)), (2, dec!(20))]);

        let mut c = coupon(DiscountType::Percent);
        c.restrictions.product_ids = vec![ProductId::new(9)];
        assert_eq!(reject(&oracle, &c, &target), CouponRejection::NotApplicableToItems);
        c.restrictions.product_ids = vec![ProductId::new(2)];
        assert!(oracle.is_coupon_valid(&c, &target).is_ok());

        let mut cart_wide = coupon(DiscountType::FixedCart);
        cart_wide.restrictions.excluded_product_ids = vec![ProductId::new(1)];
        assert_eq!(reject(&oracle, &cart_wide, &target), CouponRejection::ExcludedItems);

        // Per-product coupons just skip excluded lines.
        let mut per_product = coupon(DiscountType::FixedProduct);
        per_product.restrictions.excluded_product_ids = vec![ProductId::new(1)];
        assert!(oracle.is_coupon_valid(&per_product, &target).is_ok());
        per_product.restrictions.excluded_product_ids = vec![ProductId::new(1), ProductId::new(2)];
        assert_eq!(
            reject(&oracle, &per_product, &target),
            CouponRejection::NotApplicableToItems
        );
    }
}
