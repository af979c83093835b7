//! Order and cart line items.
//!
//! Targets hold a heterogeneous list of lines. Each kind is a variant of
//! [`LineItem`]; code that only cares about one kind filters with
//! [`LineItem::as_product`] / [`LineItem::as_coupon`] first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::code::CouponCode;
use super::coupon::MetaMap;
use super::id::{LineItemId, ProductId};
use super::snapshot::{CouponSnapshot, SnapshotError};

/// Discriminant of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Product,
    Coupon,
    Shipping,
    Fee,
}

/// A line on a cart or order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineItem {
    Product(ProductLine),
    Coupon(CouponLine),
    Shipping(ShippingLine),
    Fee(FeeLine),
}

impl LineItem {
    /// The line's ID.
    #[must_use]
    pub const fn id(&self) -> LineItemId {
        match self {
            Self::Product(line) => line.id,
            Self::Coupon(line) => line.id,
            Self::Shipping(line) => line.id,
            Self::Fee(line) => line.id,
        }
    }

    /// The line's kind.
    #[must_use]
    pub const fn kind(&self) -> LineItemKind {
        match self {
            Self::Product(_) => LineItemKind::Product,
            Self::Coupon(_) => LineItemKind::Coupon,
            Self::Shipping(_) => LineItemKind::Shipping,
            Self::Fee(_) => LineItemKind::Fee,
        }
    }

    #[must_use]
    pub const fn as_product(&self) -> Option<&ProductLine> {
        match self {
            Self::Product(line) => Some(line),
            _ => None,
        }
    }

    pub const fn as_product_mut(&mut self) -> Option<&mut ProductLine> {
        match self {
            Self::Product(line) => Some(line),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_coupon(&self) -> Option<&CouponLine> {
        match self {
            Self::Coupon(line) => Some(line),
            _ => None,
        }
    }

    pub const fn as_coupon_mut(&mut self) -> Option<&mut CouponLine> {
        match self {
            Self::Coupon(line) => Some(line),
            _ => None,
        }
    }
}

/// A purchased product.
///
/// `subtotal`/`subtotal_tax` are the pre-discount amounts for the whole line
/// (unit price × quantity); `total`/`total_tax` are after coupon discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub id: LineItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub subtotal: Decimal,
    #[serde(default)]
    pub subtotal_tax: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
}

impl ProductLine {
    /// Create an undiscounted line.
    #[must_use]
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        quantity: u32,
        subtotal: Decimal,
        subtotal_tax: Decimal,
    ) -> Self {
        Self {
            id,
            product_id,
            name: String::new(),
            quantity,
            subtotal,
            subtotal_tax,
            total: subtotal,
            total_tax: subtotal_tax,
        }
    }

}

/// An applied coupon, persisted on orders as its own line.
///
/// `meta` carries the snapshot of the coupon taken when it was applied, so
/// the discount can be rebuilt after the coupon itself is edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponLine {
    pub id: LineItemId,
    pub code: CouponCode,
    /// Tax-exclusive discount granted by this coupon.
    #[serde(default)]
    pub discount: Decimal,
    /// Tax removed by this coupon.
    #[serde(default)]
    pub discount_tax: Decimal,
    #[serde(default)]
    pub meta: MetaMap,
}

impl CouponLine {
    /// Create a coupon line carrying `snapshot` in its metadata.
    #[must_use]
    pub fn new(id: LineItemId, snapshot: &CouponSnapshot) -> Self {
        let mut meta = MetaMap::new();
        snapshot.write_meta(&mut meta);
        Self {
            id,
            code: snapshot.code.clone(),
            discount: Decimal::ZERO,
            discount_tax: Decimal::ZERO,
            meta,
        }
    }

    /// Decode the snapshot stored on this line, if any.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if snapshot metadata exists but is malformed.
    pub fn snapshot(&self) -> Result<Option<CouponSnapshot>, SnapshotError> {
        CouponSnapshot::from_meta(&self.meta)
    }
}

/// A shipping charge. Coupons never discount it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub id: LineItemId,
    #[serde(default)]
    pub method: String,
    pub total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
}

/// A fee. Coupons never discount it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub id: LineItemId,
    #[serde(default)]
    pub name: String,
    pub total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
}
