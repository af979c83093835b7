//! Decimal money helpers.
//!
//! Amounts are plain [`Decimal`] values in the store currency's standard unit
//! (e.g., dollars, not cents). Discount allocation works in minor units so that
//! per-item shares always add back up to the coupon total; [`Precision`] does
//! the conversion in both directions.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places prices are rounded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Precision(u32);

impl Precision {
    /// Largest supported number of decimal places.
    pub const MAX: u32 = 8;

    /// Create a precision, clamped to [`Self::MAX`] decimal places.
    #[must_use]
    pub const fn new(decimals: u32) -> Self {
        if decimals > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(decimals)
        }
    }

    /// Number of decimal places.
    #[must_use]
    pub const fn decimals(self) -> u32 {
        self.0
    }

    /// Round an amount to this precision, halves away from zero.
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Convert an amount into whole minor units (e.g., 12.345 -> 1235 cents).
    #[must_use]
    pub fn to_minor(self, amount: Decimal) -> Decimal {
        (amount * self.scale()).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Convert whole minor units back into an amount.
    #[must_use]
    pub fn from_minor(self, minor: Decimal) -> Decimal {
        (minor / self.scale()).round_dp(self.0)
    }

    fn scale(self) -> Decimal {
        Decimal::from(10_u64.pow(self.0))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self(2)
    }
}

/// Share of `tax` carried by `amount` when `tax` was charged on `base`.
///
/// Returns zero when the base is zero, which is how untaxed lines report.
#[must_use]
pub fn proportional_tax(amount: Decimal, base: Decimal, tax: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    amount * tax / base
}

/// Tax contained in a tax-inclusive `amount`, given the line's tax-exclusive
/// `base` and the `tax` charged on it.
#[must_use]
pub fn inclusive_tax(amount: Decimal, base: Decimal, tax: Decimal) -> Decimal {
    let gross = base + tax;
    if gross.is_zero() {
        return Decimal::ZERO;
    }
    amount * tax / gross
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_default_precision_is_cents() {
        assert_eq!(Precision::default().decimals(), 2);
    }

    #[test]
    fn test_precision_is_clamped() {
        assert_eq!(Precision::new(30).decimals(), Precision::MAX);
    }

    #[test]
    fn test_round_midpoint_away_from_zero() {
        let p = Precision::default();
        assert_eq!(p.round(dec!(1.005)), dec!(1.01));
        assert_eq!(p.round(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_minor_units_conversion() {
        let p = Precision::default();
        assert_eq!(p.to_minor(dec!(12.345)), dec!(1235));
        assert_eq!(p.from_minor(dec!(1235)), dec!(12.35));
        assert_eq!(Precision::new(0).to_minor(dec!(12.5)), dec!(13));
    }

    #[test]
    fn test_proportional_tax() {
        assert_eq!(proportional_tax(dec!(10), dec!(50), dec!(5)), dec!(1));
        assert_eq!(proportional_tax(dec!(10), Decimal::ZERO, dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn test_inclusive_tax() {
        assert_eq!(inclusive_tax(dec!(11), dec!(50), dec!(5)), dec!(1));
        assert_eq!(inclusive_tax(dec!(11), dec!(50), Decimal::ZERO), Decimal::ZERO);
    }
}
