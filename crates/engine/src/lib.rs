//! Auto Coupon library.
//!
//! Automatically applies coupons flagged "auto apply" to carts and orders
//! whenever their restrictions are met, and keeps order line totals in sync
//! with the applied coupons, including coupons deleted since they were
//! applied.
//!
//! The host platform is reached only through the traits in [`host`]; the
//! [`memory`] module implements them in memory.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod cart;
pub mod config;
pub mod discounts;
pub mod display;
pub mod eligibility;
pub mod error;
pub mod hooks;
pub mod host;
pub mod i18n;
pub mod memory;
pub mod order;
pub mod plugin;
pub mod recalc;
pub mod restrictions;
pub mod selector;

pub use config::AutoCouponConfig;
pub use error::AutoCouponError;
pub use plugin::AutoCoupon;
