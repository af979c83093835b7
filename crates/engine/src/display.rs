//! Cart rendering filters for auto-applied coupons.
//!
//! Shoppers can't remove an auto-apply coupon (it would come straight back on
//! the next totals pass), so its remove link is hidden, and it is labelled
//! with its description rather than its code.

use auto_coupon_core::Coupon;

/// Filter the HTML of a coupon row's value cell.
///
/// `coupon_html` is the host's markup (discount amount plus remove link),
/// `discount_amount_html` the discount amount alone.
#[must_use]
pub fn coupon_html(
    coupon: &Coupon,
    meta_key: &str,
    coupon_html: String,
    discount_amount_html: String,
) -> String {
    if coupon.meta_flag(meta_key) {
        discount_amount_html
    } else {
        coupon_html
    }
}

/// Filter the label of a coupon row.
///
/// Auto-apply coupons show their description, or their code when the
/// description is empty or `"0"`. Whitespace counts as a description.
#[must_use]
pub fn coupon_label(coupon: &Coupon, meta_key: &str, label: String) -> String {
    if !coupon.meta_flag(meta_key) {
        return label;
    }
    if matches!(coupon.description.as_str(), "" | "0") {
        coupon.code.to_string()
    } else {
        coupon.description.clone()
    }
}
