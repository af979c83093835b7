//! Coupon store over a `BTreeMap`.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use auto_coupon_core::{Coupon, CouponCode, CouponId, CouponStatus};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::host::{CouponQuery, CouponStore};

/// Coupons held in memory, keyed and ordered by ID.
#[derive(Debug, Default)]
pub struct MemoryCouponStore {
    coupons: RefCell<BTreeMap<CouponId, Coupon>>,
    last_id: Cell<i64>,
    unavailable: Cell<bool>,
}

impl MemoryCouponStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `coupons`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if two coupons share a code.
    pub fn with_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Result<Self, StoreError> {
        let store = Self::new();
        for coupon in coupons {
            store.create(coupon)?;
        }
        Ok(store)
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.coupons.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coupons.borrow().is_empty()
    }

    /// All coupons, in ID order.
    #[must_use]
    pub fn coupons(&self) -> Vec<Coupon> {
        self.coupons.borrow().values().cloned().collect()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.get() {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    fn code_taken(&self, code: &CouponCode, except: Option<CouponId>) -> bool {
        self.coupons.borrow().values().any(|c| {
            &c.code == code && c.status != CouponStatus::Trash && c.id != except
        })
    }

    fn with_coupon<R>(
        &self,
        id: CouponId,
        f: impl FnOnce(&mut Coupon) -> R,
    ) -> Result<R, StoreError> {
        self.ensure_available()?;
        let mut coupons = self.coupons.borrow_mut();
        let coupon = coupons.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        Ok(f(coupon))
    }
}

impl CouponStore for MemoryCouponStore {
    fn query(&self, query: &CouponQuery) -> Result<Vec<CouponId>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .coupons
            .borrow()
            .iter()
            .filter(|(_, coupon)| query.matches(coupon))
            .map(|(id, _)| *id)
            .collect())
    }

    fn get(&self, id: CouponId) -> Result<Option<Coupon>, StoreError> {
        self.ensure_available()?;
        Ok(self.coupons.borrow().get(&id).cloned())
    }

    fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .coupons
            .borrow()
            .values()
            .find(|c| &c.code == code && c.status.is_published())
            .cloned())
    }

    fn create(&self, mut coupon: Coupon) -> Result<CouponId, StoreError> {
        self.ensure_available()?;
        if self.code_taken(&coupon.code, None) {
            return Err(StoreError::Conflict(coupon.code));
        }

        let id = CouponId::new(self.last_id.get() + 1);
        self.last_id.set(id.as_i64());
        coupon = coupon.with_id(id);
        coupon.is_virtual = false;

        debug!(coupon_id = %id, code = %coupon.code, "Created coupon");
        self.coupons.borrow_mut().insert(id, coupon);
        Ok(id)
    }

    fn update(&self, coupon: &Coupon) -> Result<(), StoreError> {
        self.ensure_available()?;
        let Some(id) = coupon.id else {
            return Err(StoreError::DataCorruption(format!(
                "coupon {} has no ID",
                coupon.code
            )));
        };
        if self.code_taken(&coupon.code, Some(id)) {
            return Err(StoreError::Conflict(coupon.code.clone()));
        }
        self.with_coupon(id, |stored| *stored = coupon.clone())
    }

    fn delete(&self, id: CouponId) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.coupons
            .borrow_mut()
            .remove(&id)
            .map(|_| debug!(coupon_id = %id, "Deleted coupon"))
            .ok_or(StoreError::NotFound(id))
    }

    fn update_meta(&self, id: CouponId, key: &str, value: Value) -> Result<(), StoreError> {
        self.with_coupon(id, |coupon| coupon.set_meta(key, value))
    }

    fn delete_meta(&self, id: CouponId, key: &str) -> Result<(), StoreError> {
        self.with_coupon(id, |coupon| {
            coupon.delete_meta(key);
        })
    }
}
