//! Coupon admin screen pieces: the "Auto apply" checkbox and the coupon list
//! marker.
//!
//! The flag is written exactly when an admin saves the coupon form, whatever
//! state the coupon's own restrictions are in.

use std::collections::HashMap;

use auto_coupon_core::{Coupon, CouponId};
use serde_json::Value;
use tracing::info;

use crate::error::StoreError;
use crate::host::CouponStore;
use crate::i18n::Translator;

/// Column of the coupon list that gets the auto-apply marker.
pub const CODE_COLUMN: &str = "coupon_code";

const LABEL: &str = "Auto apply";
const HELP: &str = "Automatically add the coupon to the customer's cart or the admin order page \
if the restrictions are met. Please enter a description when you check this box, the description \
will be shown in the customer's cart if the coupon is applied.";
const LIST_MARKER: &str = "(auto apply)";

/// A checkbox on the coupon options form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxField {
    /// Form field name; also the meta key.
    pub id: String,
    pub label: String,
    pub description: String,
    /// `"yes"` or `"no"`.
    pub value: &'static str,
}

impl CheckboxField {
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.value == "yes"
    }
}

/// Fields submitted with the coupon options form.
///
/// Browsers omit unchecked checkboxes entirely, so only presence matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponOptionsForm {
    pub fields: HashMap<String, String>,
}

impl CouponOptionsForm {
    /// Form with the given field submitted.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Describe the "Auto apply" checkbox for a coupon's options form.
#[must_use]
pub fn coupon_options_field(
    coupon: &Coupon,
    meta_key: &str,
    translator: &dyn Translator,
) -> CheckboxField {
    CheckboxField {
        id: meta_key.to_string(),
        label: translator.translate(LABEL).into_owned(),
        description: translator.translate(HELP).into_owned(),
        value: if coupon.meta_flag(meta_key) { "yes" } else { "no" },
    }
}

/// Persist the checkbox state from a submitted coupon form.
///
/// Returns the new flag value.
///
/// # Errors
///
/// Returns `StoreError` if the metadata cannot be written.
pub fn save_coupon_options(
    store: &dyn CouponStore,
    coupon_id: CouponId,
    form: &CouponOptionsForm,
    meta_key: &str,
) -> Result<bool, StoreError> {
    let checked = form.contains(meta_key);
    if checked {
        store.update_meta(coupon_id, meta_key, Value::Bool(true))?;
    } else {
        store.delete_meta(coupon_id, meta_key)?;
    }
    info!(coupon_id = %coupon_id, auto_apply = checked, "Saved coupon auto-apply option");
    Ok(checked)
}

/// Extra text for a coupon list cell.
///
/// Returns `" (auto apply)"` in the code column of flagged coupons and an
/// empty string everywhere else, including for unknown coupons.
///
/// # Errors
///
/// Returns `StoreError` if the coupon cannot be read.
pub fn coupon_list_column(
    store: &dyn CouponStore,
    column: &str,
    coupon_id: CouponId,
    meta_key: &str,
    translator: &dyn Translator,
) -> Result<String, StoreError> {
    if column != CODE_COLUMN {
        return Ok(String::new());
    }
    let flagged = store
        .get(coupon_id)?
        .is_some_and(|coupon| coupon.meta_flag(meta_key));
    Ok(if flagged {
        format!(" {}", translator.translate(LIST_MARKER))
    } else {
        String::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use auto_coupon_core::{CouponCode, DiscountType};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::i18n::Untranslated;
    use crate::memory::MemoryCouponStore;

    const KEY: &str = "_auto_apply";

    fn store_with_coupon() -> (MemoryCouponStore, CouponId) {
        let store = MemoryCouponStore::new();
        let id = store
            .create(Coupon::new(
                CouponCode::parse("SAVE10").unwrap(),
                DiscountType::FixedCart,
                dec!(10),
            ))
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_field_reflects_flag() {
        let (store, id) = store_with_coupon();
        let field = coupon_options_field(&store.get(id).unwrap().unwrap(), KEY, &Untranslated);
        assert_eq!(field.id, KEY);
        assert_eq!(field.label, "Auto apply");
        assert!(!field.is_checked());

        store.update_meta(id, KEY, Value::Bool(true)).unwrap();
        let field = coupon_options_field(&store.get(id).unwrap().unwrap(), KEY, &Untranslated);
        assert!(field.is_checked());
    }

    #[test]
    fn test_save_sets_and_clears_flag() {
        let (store, id) = store_with_coupon();

        let checked = CouponOptionsForm::default().with_field(KEY, "yes");
        assert!(save_coupon_options(&store, id, &checked, KEY).unwrap());
        assert!(store.get(id).unwrap().unwrap().meta_flag(KEY));

        let unchecked = CouponOptionsForm::default().with_field("discount_type", "fixed_cart");
        assert!(!save_coupon_options(&store, id, &unchecked, KEY).unwrap());
        assert!(store.get(id).unwrap().unwrap().meta(KEY).is_none());
    }

    #[test]
    fn test_list_column_marks_flagged_code_cell_only() {
        let (store, id) = store_with_coupon();
        assert_eq!(
            coupon_list_column(&store, CODE_COLUMN, id, KEY, &Untranslated).unwrap(),
            ""
        );

        store.update_meta(id, KEY, Value::Bool(true)).unwrap();
        assert_eq!(
            coupon_list_column(&store, CODE_COLUMN, id, KEY, &Untranslated).unwrap(),
            " (auto apply)"
        );
        assert_eq!(
            coupon_list_column(&store, "usage", id, KEY, &Untranslated).unwrap(),
            ""
        );
        assert_eq!(
            coupon_list_column(&store, CODE_COLUMN, CouponId::new(99), KEY, &Untranslated).unwrap(),
            ""
        );
    }
}
