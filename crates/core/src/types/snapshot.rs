//! Coupon snapshots stored on order coupon lines.
//!
//! When a coupon is applied to an order, a copy of the properties needed to
//! recompute its discount is kept on the coupon line. Two encodings exist:
//!
//! - `coupon_info`: compact JSON array `[id, code, type, amount]`, with a
//!   trailing `true` when the coupon grants free shipping. Written by
//!   [`CouponSnapshot::write_meta`].
//! - `coupon_data`: full JSON object. Older orders carry only this one. It is
//!   written next to `coupon_info` when the coupon has a description, since
//!   the compact array has no slot for it.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::code::CouponCode;
use super::coupon::{Coupon, MetaMap};
use super::id::CouponId;
use super::status::DiscountType;

/// Meta key of the compact snapshot.
pub const COUPON_INFO_KEY: &str = "coupon_info";
/// Meta key of the legacy full-object snapshot.
pub const COUPON_DATA_KEY: &str = "coupon_data";

/// Errors that can occur when decoding a snapshot.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(String),
    #[error("snapshot field `{0}` is missing or malformed")]
    Field(&'static str),
}

/// Properties of a coupon at the moment it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponSnapshot {
    pub id: Option<CouponId>,
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub amount: Decimal,
    pub free_shipping: bool,
    pub description: String,
}

impl CouponSnapshot {
    /// Capture the snapshot of a coupon.
    #[must_use]
    pub fn from_coupon(coupon: &Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code.clone(),
            discount_type: coupon.discount_type,
            amount: coupon.amount,
            free_shipping: coupon.free_shipping,
            description: coupon.description.clone(),
        }
    }

    /// Encode as the compact `coupon_info` string.
    #[must_use]
    pub fn to_coupon_info(&self) -> String {
        let mut info = vec![
            json!(self.id.map_or(0, |id| id.as_i64())),
            json!(self.code.as_str()),
            json!(self.discount_type.as_str()),
            json!(self.amount.normalize().to_string()),
        ];
        if self.free_shipping {
            info.push(Value::Bool(true));
        }
        Value::Array(info).to_string()
    }

    /// Encode as the full `coupon_data` object.
    #[must_use]
    pub fn to_coupon_data(&self) -> Value {
        json!({
            "id": self.id.map_or(0, |id| id.as_i64()),
            "code": self.code.as_str(),
            "discount_type": self.discount_type.as_str(),
            "amount": self.amount.normalize().to_string(),
            "free_shipping": self.free_shipping,
            "description": self.description,
        })
    }

    /// Decode the compact `coupon_info` string.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the string is not a JSON array of the
    /// expected shape.
    pub fn from_coupon_info(raw: &str) -> Result<Self, SnapshotError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SnapshotError::Json(e.to_string()))?;
        let fields = value.as_array().ok_or(SnapshotError::Field("coupon_info"))?;

        let id = match fields.first().and_then(Value::as_i64) {
            Some(0) | None => None,
            Some(id) => Some(CouponId::new(id)),
        };
        let code = fields
            .get(1)
            .and_then(Value::as_str)
            .and_then(|s| CouponCode::parse(s).ok())
            .ok_or(SnapshotError::Field("code"))?;
        let discount_type = match fields.get(2).and_then(Value::as_str) {
            Some(kind) => DiscountType::from_str(kind).map_err(|_| SnapshotError::Field("type"))?,
            None => DiscountType::default(),
        };
        let amount = match fields.get(3) {
            Some(value) => decimal_from_value(value).ok_or(SnapshotError::Field("amount"))?,
            None => Decimal::ZERO,
        };
        let free_shipping = fields.get(4).is_some_and(|v| v.as_bool() == Some(true));

        Ok(Self {
            id,
            code,
            discount_type,
            amount,
            free_shipping,
            description: String::new(),
        })
    }

    /// Decode the legacy `coupon_data` object.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the value is not an object with a valid code.
    pub fn from_coupon_data(value: &Value) -> Result<Self, SnapshotError> {
        let object = value.as_object().ok_or(SnapshotError::Field("coupon_data"))?;

        let code = object
            .get("code")
            .and_then(Value::as_str)
            .and_then(|s| CouponCode::parse(s).ok())
            .ok_or(SnapshotError::Field("code"))?;
        let discount_type = match object.get("discount_type").and_then(Value::as_str) {
            Some(kind) => {
                DiscountType::from_str(kind).map_err(|_| SnapshotError::Field("discount_type"))?
            }
            None => DiscountType::default(),
        };
        let amount = match object.get("amount") {
            Some(Value::Null) | None => Decimal::ZERO,
            Some(value) => decimal_from_value(value).ok_or(SnapshotError::Field("amount"))?,
        };

        Ok(Self {
            id: object
                .get("id")
                .and_then(Value::as_i64)
                .filter(|id| *id > 0)
                .map(CouponId::new),
            code,
            discount_type,
            amount,
            free_shipping: object
                .get("free_shipping")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            description: object
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        })
    }

    /// Read whichever snapshot encoding is present in `meta`.
    ///
    /// `coupon_info` wins over `coupon_data`; only the description is taken
    /// from `coupon_data` then. Returns `Ok(None)` when neither key exists.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the stored snapshot cannot be decoded.
    pub fn from_meta(meta: &MetaMap) -> Result<Option<Self>, SnapshotError> {
        if let Some(info) = meta.get(COUPON_INFO_KEY) {
            let mut snapshot = match info {
                Value::String(raw) => Self::from_coupon_info(raw)?,
                Value::Array(_) => Self::from_coupon_info(&info.to_string())?,
                _ => return Err(SnapshotError::Field("coupon_info")),
            };
            if let Some(description) = meta
                .get(COUPON_DATA_KEY)
                .and_then(|data| data.get("description"))
                .and_then(Value::as_str)
            {
                description.clone_into(&mut snapshot.description);
            }
            return Ok(Some(snapshot));
        }
        meta.get(COUPON_DATA_KEY)
            .map(Self::from_coupon_data)
            .transpose()
    }

    /// Store this snapshot in `meta` under `coupon_info`, plus `coupon_data`
    /// when there is a description to keep.
    pub fn write_meta(&self, meta: &mut MetaMap) {
        meta.insert(
            COUPON_INFO_KEY.to_owned(),
            Value::String(self.to_coupon_info()),
        );
        if self.description.is_empty() {
            meta.remove(COUPON_DATA_KEY);
        } else {
            meta.insert(COUPON_DATA_KEY.to_owned(), self.to_coupon_data());
        }
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) if s.trim().is_empty() => Some(Decimal::ZERO),
        Value::String(s) => parse_decimal(s.trim()),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
