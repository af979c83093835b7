//! Auto Coupon Core - Shared types library.
//!
//! This crate provides the types shared by the Auto Coupon components:
//! - `auto-coupon` - Coupon selection, reconciliation and discount recalculation
//! - `auto-coupon-cli` - Scenario runner for local experiments
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no coupon store access,
//! no host platform bindings. This keeps it lightweight and allows any host
//! adapter to depend on it.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, coupon codes, money helpers, coupons and line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
