//! Coupons as the host store holds them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::code::CouponCode;
use super::id::{CouponId, ProductId};
use super::status::{CouponStatus, DiscountType};

/// Free-form coupon metadata, keyed by meta key.
pub type MetaMap = BTreeMap<String, Value>;

/// A coupon.
///
/// `restrictions` belong to the host platform; the applicator never reads
/// them and only hands the coupon to an eligibility oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Store ID. `None` for virtual coupons that were never persisted.
    #[serde(default)]
    pub id: Option<CouponId>,
    pub code: CouponCode,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CouponStatus,
    #[serde(default)]
    pub discount_type: DiscountType,
    pub amount: Decimal,
    #[serde(default)]
    pub free_shipping: bool,
    /// Set on stand-in coupons rebuilt from order snapshots.
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub restrictions: CouponRestrictions,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Coupon {
    /// Create a published coupon with no restrictions and no metadata.
    #[must_use]
    pub fn new(code: CouponCode, discount_type: DiscountType, amount: Decimal) -> Self {
        Self {
            id: None,
            code,
            description: String::new(),
            status: CouponStatus::Publish,
            discount_type,
            amount,
            free_shipping: false,
            is_virtual: false,
            restrictions: CouponRestrictions::default(),
            meta: MetaMap::new(),
        }
    }

    /// Builder-style setter for the store ID.
    #[must_use]
    pub const fn with_id(mut self, id: CouponId) -> Self {
        self.id = Some(id);
        self
    }

    /// Builder-style setter for the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Get a metadata value.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Read a metadata value as a boolean flag.
    ///
    /// Missing keys are `false`; see [`is_truthy`] for accepted values.
    #[must_use]
    pub fn meta_flag(&self, key: &str) -> bool {
        self.meta.get(key).is_some_and(is_truthy)
    }

    /// Insert or replace a metadata value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.meta.insert(key.into(), value);
    }

    /// Remove a metadata value. Returns whether the key was present.
    pub fn delete_meta(&mut self, key: &str) -> bool {
        self.meta.remove(key).is_some()
    }
}

/// Interpret a stored metadata value as a boolean.
///
/// Accepts `true`, non-zero numbers and the strings `yes`, `true`, `on` and
/// `1` (case-insensitive). Everything else, including `null`, is `false`.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "on" | "1"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Usage restrictions the host checks before a coupon may be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponRestrictions {
    /// Coupon stops being valid at this instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Minimum items subtotal required.
    pub minimum_amount: Option<Decimal>,
    /// Maximum items subtotal allowed.
    pub maximum_amount: Option<Decimal>,
    /// Total number of times the coupon may be used.
    pub usage_limit: Option<u32>,
    /// Number of times the coupon has been used.
    pub usage_count: u32,
    /// Products the coupon is limited to. Empty means all products.
    pub product_ids: Vec<ProductId>,
    /// Products the coupon never applies to.
    pub excluded_product_ids: Vec<ProductId>,
}
