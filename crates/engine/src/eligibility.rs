//! Wraps the host's eligibility oracle into a tri-state result.

use std::rc::Rc;

use auto_coupon_core::Coupon;
use tracing::{debug, warn};

use crate::error::{CheckError, CouponRejection};
use crate::host::{DiscountTarget, EligibilityOracle};

/// Result of checking one coupon against one target.
///
/// Computed fresh on every pass; cart and order contents change in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Valid,
    Invalid(CouponRejection),
    /// The oracle failed. Treated exactly like [`Eligibility::Invalid`].
    Error(String),
}

impl Eligibility {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Evaluates coupons through an [`EligibilityOracle`].
#[derive(Clone)]
pub struct EligibilityEvaluator {
    oracle: Rc<dyn EligibilityOracle>,
}

impl EligibilityEvaluator {
    #[must_use]
    pub fn new(oracle: Rc<dyn EligibilityOracle>) -> Self {
        Self { oracle }
    }

    /// Check `coupon` against `target`. Side-effect-free apart from logging.
    pub fn evaluate(&self, coupon: &Coupon, target: &dyn DiscountTarget) -> Eligibility {
        match self.oracle.is_coupon_valid(coupon, target) {
            Ok(()) => Eligibility::Valid,
            Err(CheckError::Rejected(reason)) => {
                debug!(coupon = %coupon.code, %reason, "Coupon restrictions not met");
                Eligibility::Invalid(reason)
            }
            Err(CheckError::Failed(message)) => {
                warn!(coupon = %coupon.code, error = %message, "Eligibility check failed");
                Eligibility::Error(message)
            }
        }
    }
}

impl std::fmt::Debug for EligibilityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EligibilityEvaluator").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auto_coupon_core::{CouponCode, DiscountType, ProductLine};
    use rust_decimal_macros::dec;

    use super::*;

    struct Empty;

    impl DiscountTarget for Empty {
        fn applied_coupon_codes(&self) -> Vec<CouponCode> {
            Vec::new()
        }

        fn product_lines(&self) -> Vec<ProductLine> {
            Vec::new()
        }

        fn prices_include_tax(&self) -> bool {
            false
        }
    }

    /// Accepts codes starting with "OK", fails on "ERR", rejects the rest.
    struct ByPrefix;

    impl EligibilityOracle for ByPrefix {
        fn is_coupon_valid(
            &self,
            coupon: &Coupon,
            _target: &dyn DiscountTarget,
        ) -> Result<(), CheckError> {
            let code = coupon.code.as_str();
            if code.starts_with("OK") {
                Ok(())
            } else if code.starts_with("ERR") {
                Err(CheckError::Failed("backend down".to_string()))
            } else {
                Err(CouponRejection::Expired.into())
            }
        }
    }

    fn coupon(code: &str) -> Coupon {
        Coupon::new(CouponCode::parse(code).unwrap(), DiscountType::FixedCart, dec!(1))
    }

    #[test]
    fn test_tri_state_mapping() {
        let evaluator = EligibilityEvaluator::new(Rc::new(ByPrefix));

        assert_eq!(evaluator.evaluate(&coupon("OK1"), &Empty), Eligibility::Valid);
        assert_eq!(
            evaluator.evaluate(&coupon("NOPE"), &Empty),
            Eligibility::Invalid(CouponRejection::Expired)
        );
        assert_eq!(
            evaluator.evaluate(&coupon("ERR"), &Empty),
            Eligibility::Error("backend down".to_string())
        );
    }

    #[test]
    fn test_only_valid_is_valid() {
        assert!(Eligibility::Valid.is_valid());
        assert!(!Eligibility::Invalid(CouponRejection::NotPublished).is_valid());
        assert!(!Eligibility::Error(String::new()).is_valid());
    }
}
