//! The applicator facade: one handler per host event.

use std::rc::Rc;

use auto_coupon_core::{Coupon, CouponId};
use tracing::debug;

use crate::admin::{self, CheckboxField, CouponOptionsForm};
use crate::cart::{CartReconciler, CartReport};
use crate::config::AutoCouponConfig;
use crate::display;
use crate::eligibility::EligibilityEvaluator;
use crate::error::{AutoCouponError, StoreError};
use crate::hooks::{self, HookRegistry};
use crate::host::{CartTarget, CommitDiscountAllocations, CouponStore, EligibilityOracle, OrderTarget};
use crate::i18n::{LANGUAGES_DIR, TEXT_DOMAIN, TextLoader, Translator, Untranslated};
use crate::order::{OrderPass, OrderReconciler};
use crate::recalc::Recalculator;
use crate::selector::AutoApplySelector;

/// Auto-applies flagged coupons to carts and orders.
///
/// Built once at startup; [`AutoCoupon::register`] then wires it into the
/// host. Not `Send`: the host runs one request per worker.
pub struct AutoCoupon {
    config: AutoCouponConfig,
    store: Rc<dyn CouponStore>,
    translator: Rc<dyn Translator>,
    cart: CartReconciler,
    order: OrderReconciler,
}

impl AutoCoupon {
    /// Assemble the applicator from its host collaborators.
    #[must_use]
    pub fn new(
        config: AutoCouponConfig,
        store: Rc<dyn CouponStore>,
        oracle: Rc<dyn EligibilityOracle>,
    ) -> Self {
        let selector = AutoApplySelector::new(Rc::clone(&store), config.meta_key.as_str());
        let evaluator = EligibilityEvaluator::new(oracle);
        let recalculator = Recalculator::new(Rc::clone(&store), config.precision);

        Self {
            cart: CartReconciler::new(selector.clone(), evaluator.clone()),
            order: OrderReconciler::new(selector, evaluator, recalculator),
            translator: Rc::new(Untranslated),
            store,
            config,
        }
    }

    /// Use `translator` for admin labels.
    #[must_use]
    pub fn with_translator(mut self, translator: Rc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AutoCouponConfig {
        &self.config
    }

    /// Register all handlers with the host. Returns the number registered,
    /// zero when coupons are disabled.
    pub fn register(&self, registry: &mut dyn HookRegistry) -> usize {
        hooks::register_hooks(&self.config, registry)
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// `TextsReady`: ask the host to load our translations.
    pub fn on_texts_ready(&self, loader: &mut dyn TextLoader) -> bool {
        let loaded = loader.load_text_domain(TEXT_DOMAIN, LANGUAGES_DIR);
        debug!(domain = TEXT_DOMAIN, loaded, "Loaded text domain");
        loaded
    }

    /// `CouponOptions`: the checkbox to render on the coupon form.
    #[must_use]
    pub fn coupon_options_field(&self, coupon: &Coupon) -> CheckboxField {
        admin::coupon_options_field(coupon, &self.config.meta_key, self.translator.as_ref())
    }

    /// `CouponOptionsSave`: persist the checkbox.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the metadata cannot be written.
    pub fn save_coupon_options(
        &self,
        coupon_id: CouponId,
        form: &CouponOptionsForm,
    ) -> Result<bool, StoreError> {
        admin::save_coupon_options(self.store.as_ref(), coupon_id, form, &self.config.meta_key)
    }

    /// `CouponListColumn`: extra text for a coupon list cell.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the coupon cannot be read.
    pub fn coupon_list_column(&self, column: &str, coupon_id: CouponId) -> Result<String, StoreError> {
        admin::coupon_list_column(
            self.store.as_ref(),
            column,
            coupon_id,
            &self.config.meta_key,
            self.translator.as_ref(),
        )
    }

    /// `CartTotalsCalculated`: add eligible auto-apply coupons.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if auto-apply coupons cannot be loaded.
    pub fn on_cart_totals_calculated<T: CartTarget>(&self, cart: &mut T) -> Result<CartReport, StoreError> {
        self.cart.on_totals_calculated(cart)
    }

    /// `OrderBeforeCalculateTotals`: apply/remove auto-apply coupons and
    /// recompute line totals.
    ///
    /// # Errors
    ///
    /// Returns `AutoCouponError` if the coupon store fails or the order
    /// rejects recalculated totals.
    pub fn on_order_before_calculate_totals<T>(&self, order: &mut T) -> Result<OrderPass, AutoCouponError>
    where
        T: OrderTarget + CommitDiscountAllocations,
    {
        self.order.on_before_calculate_totals(order)
    }

    /// `CartCouponHtml` filter.
    #[must_use]
    pub fn cart_coupon_html(
        &self,
        coupon: &Coupon,
        coupon_html: String,
        discount_amount_html: String,
    ) -> String {
        display::coupon_html(coupon, &self.config.meta_key, coupon_html, discount_amount_html)
    }

    /// `CartCouponLabel` filter.
    #[must_use]
    pub fn cart_coupon_label(&self, coupon: &Coupon, label: String) -> String {
        display::coupon_label(coupon, &self.config.meta_key, label)
    }
}

impl std::fmt::Debug for AutoCoupon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoCoupon")
            .field("config", &self.config)
            .field("cart", &self.cart)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
