//! Discount and tax recalculation for orders.
//!
//! Recomputes every product line's total and tax after coupon membership
//! changed, without going through the host's full totals recalculation (which
//! is what triggers the order reconciler in the first place):
//!
//! 1. Reset product lines to their pre-discount subtotals.
//! 2. Resolve each coupon line to a coupon: the live one when it still exists,
//!    otherwise a virtual stand-in rebuilt from the line's snapshot.
//! 3. Feed the coupons, in line order, into a [`DiscountAccumulator`].
//! 4. Split each discount into its tax-exclusive and tax parts and commit the
//!    result through [`CommitDiscountAllocations`].
//!
//! Step 4 only relies on each line's subtotal, subtotal tax and discount: a
//! line's effective tax rate is `subtotal_tax / subtotal`.

use std::collections::BTreeMap;
use std::rc::Rc;

use auto_coupon_core::{
    Coupon, CouponCode, CouponLine, DiscountType, LineItemId, Precision, ProductLine,
    inclusive_tax, proportional_tax,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::discounts::DiscountAccumulator;
use crate::error::AutoCouponError;
use crate::host::{CommitDiscountAllocations, CouponStore, OrderTarget};

/// Totals for one product line after discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub item_id: LineItemId,
    /// Tax-exclusive discount taken off the line.
    pub discount: Decimal,
    pub total: Decimal,
    pub total_tax: Decimal,
}

/// Discount granted by one coupon line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponAllocation {
    pub code: CouponCode,
    /// Tax-exclusive discount.
    pub discount: Decimal,
    pub discount_tax: Decimal,
}

/// Everything [`CommitDiscountAllocations`] needs to write back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountAllocations {
    pub items: Vec<ItemAllocation>,
    pub coupons: Vec<CouponAllocation>,
}

impl DiscountAllocations {
    /// Sum of tax-exclusive coupon discounts.
    #[must_use]
    pub fn discount_total(&self) -> Decimal {
        self.coupons.iter().map(|c| c.discount).sum()
    }

    /// Sum of coupon discount taxes.
    #[must_use]
    pub fn discount_tax(&self) -> Decimal {
        self.coupons.iter().map(|c| c.discount_tax).sum()
    }

    /// Allocation for a coupon code, if it is applied.
    #[must_use]
    pub fn coupon(&self, code: &CouponCode) -> Option<&CouponAllocation> {
        self.coupons.iter().find(|c| &c.code == code)
    }

    /// Allocation for a product line.
    #[must_use]
    pub fn item(&self, id: LineItemId) -> Option<&ItemAllocation> {
        self.items.iter().find(|i| i.item_id == id)
    }
}

/// Recomputes order line totals from the coupons applied to it.
#[derive(Clone)]
pub struct Recalculator {
    store: Rc<dyn CouponStore>,
    precision: Precision,
}

impl Recalculator {
    #[must_use]
    pub fn new(store: Rc<dyn CouponStore>, precision: Precision) -> Self {
        Self { store, precision }
    }

    /// Recalculate all discounts on `order` and commit them.
    ///
    /// # Errors
    ///
    /// Returns `AutoCouponError::Store` if a coupon lookup fails and
    /// `AutoCouponError::Target` if the order rejects a write. Changes made
    /// before the failure stay on the order.
    #[instrument(skip_all)]
    pub fn recalculate<T>(&self, order: &mut T) -> Result<DiscountAllocations, AutoCouponError>
    where
        T: OrderTarget + CommitDiscountAllocations,
    {
        let lines = order.product_lines();
        let prices_include_tax = order.prices_include_tax();

        for line in &lines {
            order.set_item_totals(line.id, line.subtotal, line.subtotal_tax)?;
        }

        let mut accumulator = DiscountAccumulator::new(&lines, prices_include_tax, self.precision);
        for coupon_line in order.coupon_lines() {
            let coupon = self.resolve(&coupon_line, prices_include_tax)?;
            let added = accumulator.apply_coupon(&coupon);
            debug!(coupon = %coupon.code, %added, is_virtual = coupon.is_virtual, "Applied coupon");
        }

        let allocations = allocate(&lines, &accumulator, prices_include_tax, self.precision);
        order.commit_discount_allocations(&allocations)?;
        Ok(allocations)
    }

    /// The coupon behind a coupon line.
    ///
    /// # Errors
    ///
    /// Returns `AutoCouponError::Store` if the store lookup fails. A coupon
    /// that no longer exists is not an error.
    pub fn resolve(
        &self,
        line: &CouponLine,
        prices_include_tax: bool,
    ) -> Result<Coupon, AutoCouponError> {
        match self.store.find_by_code(&line.code)? {
            Some(coupon) if coupon.status.is_published() => Ok(coupon),
            _ => {
                debug!(coupon = %line.code, "Coupon no longer in store, using snapshot");
                Ok(stand_in_coupon(line, prices_include_tax))
            }
        }
    }
}

impl std::fmt::Debug for Recalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recalculator")
            .field("precision", &self.precision)
            .finish_non_exhaustive()
    }
}

/// Build a virtual fixed-cart coupon reproducing a coupon line's recorded
/// discount.
///
/// The amount is the recorded discount, plus its tax when prices include tax,
/// so that reapplying it to unchanged lines yields the same discount.
#[must_use]
pub fn stand_in_coupon(line: &CouponLine, prices_include_tax: bool) -> Coupon {
    let amount = if prices_include_tax {
        line.discount + line.discount_tax
    } else {
        line.discount
    };

    let mut coupon = Coupon::new(line.code.clone(), DiscountType::FixedCart, amount);
    coupon.is_virtual = true;

    match line.snapshot() {
        Ok(Some(snapshot)) => {
            coupon.description = snapshot.description;
            coupon.free_shipping = snapshot.free_shipping;
        }
        Ok(None) => {}
        Err(e) => warn!(coupon = %line.code, error = %e, "Ignoring unreadable coupon snapshot"),
    }
    coupon
}

/// Turn accumulated discounts into per-line and per-coupon amounts.
fn allocate(
    lines: &[ProductLine],
    accumulator: &DiscountAccumulator,
    prices_include_tax: bool,
    precision: Precision,
) -> DiscountAllocations {
    let by_item = accumulator.discounts_by_item();
    let lines_by_id: BTreeMap<LineItemId, &ProductLine> =
        lines.iter().map(|line| (line.id, line)).collect();

    let items = lines
        .iter()
        .map(|line| {
            let discount = by_item.get(&line.id).copied().unwrap_or_default();
            item_allocation(line, discount, prices_include_tax, precision)
        })
        .collect();

    let coupons = accumulator
        .coupon_discounts()
        .into_iter()
        .map(|coupon| {
            let mut gross = Decimal::ZERO;
            let mut tax = Decimal::ZERO;
            for (item_id, amount) in &coupon.by_item {
                gross += *amount;
                if let Some(line) = lines_by_id.get(item_id) {
                    tax += if prices_include_tax {
                        inclusive_tax(*amount, line.subtotal, line.subtotal_tax)
                    } else {
                        proportional_tax(*amount, line.subtotal, line.subtotal_tax)
                    };
                }
            }
            let discount_tax = precision.round(tax);
            let discount = if prices_include_tax {
                precision.round(gross) - discount_tax
            } else {
                precision.round(gross)
            };
            CouponAllocation {
                code: coupon.code,
                discount,
                discount_tax,
            }
        })
        .collect();

    DiscountAllocations { items, coupons }
}

fn item_allocation(
    line: &ProductLine,
    discount: Decimal,
    prices_include_tax: bool,
    precision: Precision,
) -> ItemAllocation {
    if discount.is_zero() {
        return ItemAllocation {
            item_id: line.id,
            discount: Decimal::ZERO,
            total: line.subtotal,
            total_tax: line.subtotal_tax,
        };
    }

    let exclusive = if prices_include_tax {
        discount - precision.round(inclusive_tax(discount, line.subtotal, line.subtotal_tax))
    } else {
        discount
    };
    let total = (line.subtotal - exclusive).max(Decimal::ZERO);
    let total_tax = precision.round(proportional_tax(total, line.subtotal, line.subtotal_tax));

    ItemAllocation {
        item_id: line.id,
        discount: line.subtotal - total,
        total,
        total_tax,
    }
}
