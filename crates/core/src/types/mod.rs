//! Core types for Auto Coupon.
//!
//! This module provides type-safe wrappers for coupons, line items and money.

pub mod code;
pub mod coupon;
pub mod id;
pub mod line_item;
pub mod money;
pub mod snapshot;
pub mod status;

pub use code::{CouponCode, CouponCodeError};
pub use coupon::{Coupon, CouponRestrictions, MetaMap, is_truthy};
pub use id::*;
pub use line_item::{CouponLine, FeeLine, LineItem, LineItemKind, ProductLine, ShippingLine};
pub use money::{Precision, inclusive_tax, proportional_tax};
pub use snapshot::{COUPON_DATA_KEY, COUPON_INFO_KEY, CouponSnapshot, SnapshotError};
pub use status::{CouponStatus, DiscountType};
