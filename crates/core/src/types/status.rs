//! Status and kind enums for coupons.

use serde::{Deserialize, Serialize};

/// Publication status of a coupon in the store.
///
/// Only published coupons are ever auto-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
    Trash,
}

impl CouponStatus {
    /// Whether the coupon is visible to shoppers.
    #[must_use]
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Publish => write!(f, "publish"),
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Private => write!(f, "private"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// How a coupon's amount is turned into a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage off every qualifying line.
    Percent,
    /// Fixed amount off the whole cart, split across lines.
    #[default]
    FixedCart,
    /// Fixed amount off each unit of every qualifying line.
    FixedProduct,
}

impl DiscountType {
    /// Whether the coupon applies to the cart as a whole rather than per product.
    #[must_use]
    pub const fn is_cart_wide(self) -> bool {
        matches!(self, Self::Percent | Self::FixedCart)
    }

    /// Stable string form used in snapshot metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::FixedCart => "fixed_cart",
            Self::FixedProduct => "fixed_product",
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Self::Percent),
            "fixed_cart" => Ok(Self::FixedCart),
            "fixed_product" => Ok(Self::FixedProduct),
            _ => Err(format!("invalid discount type: {s}")),
        }
    }
}
