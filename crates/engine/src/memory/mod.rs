//! In-memory host adapter.
//!
//! Implements every host trait over plain collections. Used by the CLI
//! simulator and the test suites; a real deployment implements the traits in
//! [`crate::host`] over its own storage instead.

mod cart;
mod order;
mod store;

pub use cart::MemoryCart;
pub use order::{BeforeTotalsHook, MemoryOrder};
pub use store::MemoryCouponStore;
