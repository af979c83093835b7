//! Scenario files: a coupon catalogue plus a cart and/or order to reconcile.
//!
//! ```yaml
//! prices_include_tax: false
//! now: 2024-06-01T12:00:00Z
//! coupons:
//!   - code: SAVE10
//!     discount_type: fixed_cart
//!     amount: "10"
//!     auto_apply: true
//! order:
//!   products:
//!     - { product_id: 1, name: Shirt, subtotal: "50", subtotal_tax: "5" }
//! ```

use std::path::Path;
use std::rc::Rc;

use auto_coupon::host::CouponStore;
use auto_coupon::memory::{MemoryCart, MemoryCouponStore, MemoryOrder};
use auto_coupon_core::{
    Coupon, CouponCode, CouponSnapshot, DiscountType, OrderId, Precision, ProductId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::commands::CommandError;

/// A coupon as written in a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCoupon {
    #[serde(flatten)]
    pub coupon: Coupon,
    /// Set the auto-apply flag.
    #[serde(default)]
    pub auto_apply: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioProduct {
    pub product_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub subtotal: Decimal,
    #[serde(default)]
    pub subtotal_tax: Decimal,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioShipping {
    #[serde(default)]
    pub method: String,
    pub total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
}

/// A coupon line recorded on an order before this run, e.g. for a coupon
/// that has since been deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCouponLine {
    pub code: CouponCode,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub discount: Decimal,
    #[serde(default)]
    pub discount_tax: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioCart {
    #[serde(default)]
    pub products: Vec<ScenarioProduct>,
    /// Codes the shopper already applied.
    #[serde(default)]
    pub applied: Vec<CouponCode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioOrder {
    #[serde(default = "default_order_id")]
    pub id: i64,
    #[serde(default)]
    pub products: Vec<ScenarioProduct>,
    #[serde(default)]
    pub shipping: Vec<ScenarioShipping>,
    #[serde(default)]
    pub coupon_lines: Vec<ScenarioCouponLine>,
}

const fn default_order_id() -> i64 {
    1
}

/// A whole scenario file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub prices_include_tax: bool,
    /// Evaluation time for coupon expiry; defaults to now.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coupons: Vec<ScenarioCoupon>,
    #[serde(default)]
    pub cart: Option<ScenarioCart>,
    #[serde(default)]
    pub order: Option<ScenarioOrder>,
}

impl Scenario {
    /// Read and parse a scenario file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CommandError> {
        if !path.exists() {
            return Err(CommandError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Build the coupon store, flagging auto-apply coupons under `meta_key`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if two coupons share a code.
    pub fn coupon_store(&self, meta_key: &str) -> Result<MemoryCouponStore, CommandError> {
        let coupons = self.coupons.iter().map(|entry| {
            let mut coupon = entry.coupon.clone();
            if entry.auto_apply {
                coupon.set_meta(meta_key, serde_json::Value::Bool(true));
            }
            coupon
        });
        Ok(MemoryCouponStore::with_coupons(coupons)?)
    }
}

impl ScenarioCart {
    /// Build the cart. Already-applied codes are recorded without validation.
    #[must_use]
    pub fn build(
        &self,
        prices_include_tax: bool,
        store: Rc<dyn CouponStore>,
        precision: Precision,
    ) -> MemoryCart {
        let mut cart = MemoryCart::new(prices_include_tax).with_store(store, precision);
        for product in &self.products {
            cart.add_product(
                ProductId::new(product.product_id),
                product.quantity,
                product.subtotal,
                product.subtotal_tax,
            );
        }
        for code in &self.applied {
            cart.restore_coupon(code.clone());
        }
        cart
    }
}

impl ScenarioOrder {
    /// Build the order, recorded coupon lines included.
    #[must_use]
    pub fn build(&self, prices_include_tax: bool) -> MemoryOrder {
        let mut order = MemoryOrder::new(OrderId::new(self.id), prices_include_tax);
        for product in &self.products {
            order.add_product(
                ProductId::new(product.product_id),
                product.name.clone(),
                product.quantity,
                product.subtotal,
                product.subtotal_tax,
            );
        }
        for shipping in &self.shipping {
            order.add_shipping(shipping.method.clone(), shipping.total, shipping.total_tax);
        }
        for recorded in &self.coupon_lines {
            let snapshot = CouponSnapshot {
                id: None,
                code: recorded.code.clone(),
                discount_type: recorded.discount_type,
                amount: recorded.amount,
                free_shipping: false,
                description: recorded.description.clone(),
            };
            order.record_coupon_line(&snapshot, recorded.discount, recorded.discount_tax);
        }
        order
    }
}
