//! Discount accumulator.
//!
//! Tracks how much each applied coupon takes off each product line during one
//! recalculation. All arithmetic happens in whole minor units (cents at two
//! decimals) so that per-line shares always add back up to the coupon's total.
//!
//! Lines are visited by price, most expensive first. A line is never
//! discounted below zero, however many coupons stack on it.

use std::collections::BTreeMap;

use auto_coupon_core::{
    Coupon, CouponCode, DiscountType, LineItemId, Precision, ProductId, ProductLine,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::host::DiscountTarget;

#[derive(Debug, Clone)]
struct Item {
    id: LineItemId,
    product_id: ProductId,
    quantity: u32,
    /// Price in minor units.
    price: Decimal,
    /// Discount already taken off, in minor units.
    discounted: Decimal,
}

impl Item {
    fn remaining(&self) -> Decimal {
        (self.price - self.discounted).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    code: CouponCode,
    by_item: BTreeMap<LineItemId, Decimal>,
}

/// Discount one coupon takes off each line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponDiscount {
    pub code: CouponCode,
    pub by_item: BTreeMap<LineItemId, Decimal>,
}

impl CouponDiscount {
    /// Total discount granted by this coupon.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.by_item.values().copied().sum()
    }
}

/// Accumulates per-line and per-coupon discounts for one target.
#[derive(Debug, Clone)]
pub struct DiscountAccumulator {
    precision: Precision,
    items: Vec<Item>,
    entries: Vec<Entry>,
}

impl DiscountAccumulator {
    /// Bind an accumulator to a set of product lines.
    ///
    /// When `prices_include_tax` is set, line prices (and therefore discounts)
    /// are tax-inclusive.
    #[must_use]
    pub fn new(lines: &[ProductLine], prices_include_tax: bool, precision: Precision) -> Self {
        let mut items: Vec<Item> = lines
            .iter()
            .map(|line| {
                let price = if prices_include_tax {
                    line.subtotal + line.subtotal_tax
                } else {
                    line.subtotal
                };
                Item {
                    id: line.id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: precision.to_minor(price).max(Decimal::ZERO),
                    discounted: Decimal::ZERO,
                }
            })
            .collect();
        items.sort_by(|a, b| b.price.cmp(&a.price));

        Self {
            precision,
            items,
            entries: Vec::new(),
        }
    }

    /// Bind an accumulator to a target's product lines.
    #[must_use]
    pub fn for_target(target: &dyn DiscountTarget, precision: Precision) -> Self {
        Self::new(
            &target.product_lines(),
            target.prices_include_tax(),
            precision,
        )
    }

    /// Apply a coupon on top of those already applied.
    ///
    /// No validation happens here; callers decide which coupons belong on the
    /// target. Returns the discount this coupon added.
    pub fn apply_coupon(&mut self, coupon: &Coupon) -> Decimal {
        let shares = match coupon.discount_type {
            DiscountType::Percent => self.percent_shares(coupon),
            DiscountType::FixedProduct => self.fixed_product_shares(coupon),
            DiscountType::FixedCart => self.fixed_cart_shares(coupon),
        };
        let added = self.commit(&coupon.code, &shares);
        self.precision.from_minor(added)
    }

    /// Total discount per line.
    #[must_use]
    pub fn discounts_by_item(&self) -> BTreeMap<LineItemId, Decimal> {
        self.items
            .iter()
            .map(|item| (item.id, self.precision.from_minor(item.discounted)))
            .collect()
    }

    /// Total discount per coupon, in application order.
    #[must_use]
    pub fn discounts_by_coupon(&self) -> Vec<(CouponCode, Decimal)> {
        self.coupon_discounts()
            .into_iter()
            .map(|discount| {
                let total = discount.total();
                (discount.code, total)
            })
            .collect()
    }

    /// Per-line breakdown for every applied coupon, in application order.
    #[must_use]
    pub fn coupon_discounts(&self) -> Vec<CouponDiscount> {
        self.entries
            .iter()
            .map(|entry| CouponDiscount {
                code: entry.code.clone(),
                by_item: entry
                    .by_item
                    .iter()
                    .map(|(id, minor)| (*id, self.precision.from_minor(*minor)))
                    .collect(),
            })
            .collect()
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    fn percent_shares(&self, coupon: &Coupon) -> Vec<Decimal> {
        let rate = coupon.amount.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED;
        let mut base_total = Decimal::ZERO;

        let mut shares: Vec<Decimal> = self
            .items
            .iter()
            .map(|item| {
                if !applies_to(coupon, item.product_id) {
                    return Decimal::ZERO;
                }
                base_total += item.price;
                (item.price * rate).floor().min(item.remaining())
            })
            .collect();

        let target = (base_total * rate).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let allocated: Decimal = shares.iter().copied().sum();
        self.distribute_remainder(coupon, &mut shares, target - allocated);
        shares
    }

    fn fixed_product_shares(&self, coupon: &Coupon) -> Vec<Decimal> {
        let per_unit = self.precision.to_minor(coupon.amount).max(Decimal::ZERO);
        self.items
            .iter()
            .map(|item| {
                if applies_to(coupon, item.product_id) {
                    (per_unit * Decimal::from(item.quantity)).min(item.remaining())
                } else {
                    Decimal::ZERO
                }
            })
            .collect()
    }

    fn fixed_cart_shares(&self, coupon: &Coupon) -> Vec<Decimal> {
        let eligible_remaining: Decimal = self
            .items
            .iter()
            .filter(|item| applies_to(coupon, item.product_id))
            .map(Item::remaining)
            .sum();
        if eligible_remaining.is_zero() {
            return vec![Decimal::ZERO; self.items.len()];
        }

        let amount = self
            .precision
            .to_minor(coupon.amount)
            .max(Decimal::ZERO)
            .min(eligible_remaining);

        let mut shares: Vec<Decimal> = self
            .items
            .iter()
            .map(|item| {
                if applies_to(coupon, item.product_id) {
                    (amount * item.remaining() / eligible_remaining).floor()
                } else {
                    Decimal::ZERO
                }
            })
            .collect();

        let allocated: Decimal = shares.iter().copied().sum();
        self.distribute_remainder(coupon, &mut shares, amount - allocated);
        shares
    }

    /// Hand out leftover minor units, up to one per unit of quantity per line
    /// per round, until nothing is left or every line is fully discounted.
    fn distribute_remainder(&self, coupon: &Coupon, shares: &mut [Decimal], mut remainder: Decimal) {
        while remainder > Decimal::ZERO {
            let mut progressed = false;
            for (share, item) in shares.iter_mut().zip(&self.items) {
                if remainder <= Decimal::ZERO {
                    break;
                }
                if !applies_to(coupon, item.product_id) {
                    continue;
                }
                let headroom = item.remaining() - *share;
                if headroom <= Decimal::ZERO {
                    continue;
                }
                let step = Decimal::from(item.quantity.max(1))
                    .min(headroom)
                    .min(remainder);
                *share += step;
                remainder -= step;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    fn commit(&mut self, code: &CouponCode, shares: &[Decimal]) -> Decimal {
        let position = match self.entries.iter().position(|e| &e.code == code) {
            Some(position) => position,
            None => {
                self.entries.push(Entry {
                    code: code.clone(),
                    by_item: BTreeMap::new(),
                });
                self.entries.len() - 1
            }
        };

        let mut added = Decimal::ZERO;
        for (item, share) in self.items.iter_mut().zip(shares) {
            if *share <= Decimal::ZERO {
                continue;
            }
            item.discounted += *share;
            added += *share;
            if let Some(entry) = self.entries.get_mut(position) {
                *entry.by_item.entry(item.id).or_insert(Decimal::ZERO) += *share;
            }
        }
        added
    }
}

/// Whether a coupon's product restrictions allow it on this product.
fn applies_to(coupon: &Coupon, product_id: ProductId) -> bool {
    let restrictions = &coupon.restrictions;
    (restrictions.product_ids.is_empty() || restrictions.product_ids.contains(&product_id))
        && !restrictions.excluded_product_ids.contains(&product_id)
}
