//! An order being edited by an admin.

use std::rc::Rc;

use auto_coupon_core::{
    Coupon, CouponCode, CouponLine, CouponSnapshot, FeeLine, LineItem, LineItemId, OrderId,
    ProductId, ProductLine, ShippingLine,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::TargetError;
use crate::host::{CommitDiscountAllocations, DiscountTarget, OrderTarget};
use crate::recalc::DiscountAllocations;

/// Callback fired at the start of [`MemoryOrder::calculate_totals`].
pub type BeforeTotalsHook = Rc<dyn Fn(&mut MemoryOrder)>;

/// Order held in memory.
///
/// Like most hosts, applying or removing a coupon recalculates the order's
/// totals, which fires the before-totals hook again.
pub struct MemoryOrder {
    id: OrderId,
    items: Vec<LineItem>,
    prices_include_tax: bool,
    last_line_id: i64,
    discount_total: Decimal,
    discount_tax: Decimal,
    before_totals: Option<BeforeTotalsHook>,
}

impl MemoryOrder {
    #[must_use]
    pub const fn new(id: OrderId, prices_include_tax: bool) -> Self {
        Self {
            id,
            items: Vec::new(),
            prices_include_tax,
            last_line_id: 0,
            discount_total: Decimal::ZERO,
            discount_tax: Decimal::ZERO,
            before_totals: None,
        }
    }

    /// Fire `hook` whenever totals are about to be recalculated.
    #[must_use]
    pub fn with_before_totals_hook(mut self, hook: BeforeTotalsHook) -> Self {
        self.before_totals = Some(hook);
        self
    }

    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    fn next_line_id(&mut self) -> LineItemId {
        self.last_line_id += 1;
        LineItemId::new(self.last_line_id)
    }

    /// Add an undiscounted product line and return its ID.
    pub fn add_product(
        &mut self,
        product_id: ProductId,
        name: impl Into<String>,
        quantity: u32,
        subtotal: Decimal,
        subtotal_tax: Decimal,
    ) -> LineItemId {
        let id = self.next_line_id();
        let mut line = ProductLine::new(id, product_id, quantity, subtotal, subtotal_tax);
        line.name = name.into();
        self.items.push(LineItem::Product(line));
        id
    }

    /// Add a shipping line and return its ID.
    pub fn add_shipping(
        &mut self,
        method: impl Into<String>,
        total: Decimal,
        total_tax: Decimal,
    ) -> LineItemId {
        let id = self.next_line_id();
        self.items.push(LineItem::Shipping(ShippingLine {
            id,
            method: method.into(),
            total,
            total_tax,
        }));
        id
    }

    /// Add a fee line and return its ID.
    pub fn add_fee(&mut self, name: impl Into<String>, total: Decimal, total_tax: Decimal) -> LineItemId {
        let id = self.next_line_id();
        self.items.push(LineItem::Fee(FeeLine {
            id,
            name: name.into(),
            total,
            total_tax,
        }));
        id
    }

    /// Attach a coupon line recorded by an earlier run, discount included.
    /// The coupon itself need not exist anymore.
    pub fn record_coupon_line(
        &mut self,
        snapshot: &CouponSnapshot,
        discount: Decimal,
        discount_tax: Decimal,
    ) -> LineItemId {
        let id = self.next_line_id();
        let mut line = CouponLine::new(id, snapshot);
        line.discount = discount;
        line.discount_tax = discount_tax;
        self.items.push(LineItem::Coupon(line));
        id
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn product_line(&self, id: LineItemId) -> Option<&ProductLine> {
        self.items
            .iter()
            .filter_map(LineItem::as_product)
            .find(|line| line.id == id)
    }

    #[must_use]
    pub fn coupon_line(&self, code: &CouponCode) -> Option<&CouponLine> {
        self.items
            .iter()
            .filter_map(LineItem::as_coupon)
            .find(|line| &line.code == code)
    }

    /// Tax-exclusive discount of all coupons, as last committed.
    #[must_use]
    pub const fn discount_total(&self) -> Decimal {
        self.discount_total
    }

    #[must_use]
    pub const fn discount_tax(&self) -> Decimal {
        self.discount_tax
    }

    /// Grand total: every line's total plus its tax.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| match item {
                LineItem::Product(line) => line.total + line.total_tax,
                LineItem::Shipping(line) => line.total + line.total_tax,
                LineItem::Fee(line) => line.total + line.total_tax,
                LineItem::Coupon(_) => Decimal::ZERO,
            })
            .sum()
    }

    /// Recalculate totals, firing the before-totals hook first.
    pub fn calculate_totals(&mut self) -> Decimal {
        if let Some(hook) = self.before_totals.clone() {
            hook(self);
        }
        let total = self.total();
        debug!(order_id = %self.id, %total, "Calculated order totals");
        total
    }
}

impl DiscountTarget for MemoryOrder {
    fn applied_coupon_codes(&self) -> Vec<CouponCode> {
        self.items
            .iter()
            .filter_map(LineItem::as_coupon)
            .map(|line| line.code.clone())
            .collect()
    }

    fn product_lines(&self) -> Vec<ProductLine> {
        self.items
            .iter()
            .filter_map(LineItem::as_product)
            .cloned()
            .collect()
    }

    fn prices_include_tax(&self) -> bool {
        self.prices_include_tax
    }
}

impl OrderTarget for MemoryOrder {
    fn coupon_lines(&self) -> Vec<CouponLine> {
        self.items
            .iter()
            .filter_map(LineItem::as_coupon)
            .cloned()
            .collect()
    }

    fn apply_coupon(&mut self, coupon: &Coupon) -> Result<bool, TargetError> {
        if self.is_coupon_applied(&coupon.code) {
            return Ok(false);
        }
        let id = self.next_line_id();
        let snapshot = CouponSnapshot::from_coupon(coupon);
        self.items
            .push(LineItem::Coupon(CouponLine::new(id, &snapshot)));
        self.calculate_totals();
        Ok(true)
    }

    fn remove_coupon(&mut self, code: &CouponCode) -> Result<bool, TargetError> {
        let before = self.items.len();
        self.items
            .retain(|item| item.as_coupon().is_none_or(|line| &line.code != code));
        if self.items.len() == before {
            return Ok(false);
        }
        self.calculate_totals();
        Ok(true)
    }

    fn set_item_totals(
        &mut self,
        id: LineItemId,
        total: Decimal,
        total_tax: Decimal,
    ) -> Result<(), TargetError> {
        let line = self
            .items
            .iter_mut()
            .filter_map(LineItem::as_product_mut)
            .find(|line| line.id == id)
            .ok_or(TargetError::LineItemNotFound(id))?;
        line.total = total;
        line.total_tax = total_tax;
        Ok(())
    }
}

impl CommitDiscountAllocations for MemoryOrder {
    fn commit_discount_allocations(
        &mut self,
        allocations: &DiscountAllocations,
    ) -> Result<(), TargetError> {
        for item in &allocations.items {
            self.set_item_totals(item.item_id, item.total, item.total_tax)?;
        }
        for coupon in &allocations.coupons {
            let line = self
                .items
                .iter_mut()
                .filter_map(LineItem::as_coupon_mut)
                .find(|line| line.code == coupon.code)
                .ok_or_else(|| TargetError::Rejected(format!("no coupon line for {}", coupon.code)))?;
            line.discount = coupon.discount;
            line.discount_tax = coupon.discount_tax;
        }
        self.discount_total = allocations.discount_total();
        self.discount_tax = allocations.discount_tax();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOrder")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("prices_include_tax", &self.prices_include_tax)
            .field("discount_total", &self.discount_total)
            .field("discount_tax", &self.discount_tax)
            .finish_non_exhaustive()
    }
}
