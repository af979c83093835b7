//! Loads the coupons flagged for automatic application.

use std::rc::Rc;

use auto_coupon_core::Coupon;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::host::{CouponQuery, CouponStore};

/// Selects published coupons carrying the auto-apply flag.
#[derive(Clone)]
pub struct AutoApplySelector {
    store: Rc<dyn CouponStore>,
    meta_key: String,
}

impl AutoApplySelector {
    /// Create a selector reading the flag under `meta_key`.
    #[must_use]
    pub fn new(store: Rc<dyn CouponStore>, meta_key: impl Into<String>) -> Self {
        Self {
            store,
            meta_key: meta_key.into(),
        }
    }

    /// Meta key holding the auto-apply flag.
    #[must_use]
    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    /// All published auto-apply coupons, in store order.
    ///
    /// A coupon ID that disappears between the query and the fetch is skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read. Not retried.
    pub fn auto_apply_coupons(&self) -> Result<Vec<Coupon>, StoreError> {
        let query = CouponQuery::published().with_flag(self.meta_key.as_str());
        let ids = self.store.query(&query)?;

        let mut coupons = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get(id)? {
                Some(coupon) => coupons.push(coupon),
                None => warn!(coupon_id = %id, "Auto-apply coupon vanished before fetch"),
            }
        }

        debug!(count = coupons.len(), "Loaded auto-apply coupons");
        Ok(coupons)
    }
}

impl std::fmt::Debug for AutoApplySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoApplySelector")
            .field("meta_key", &self.meta_key)
            .finish_non_exhaustive()
    }
}
