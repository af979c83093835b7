//! Host lifecycle events the applicator listens to.
//!
//! Registration is an explicit startup step: the host calls
//! [`register_hooks`] once with its registry, and routes each event to the
//! matching [`AutoCoupon`](crate::AutoCoupon) handler. Nothing is registered
//! when the store has coupons disabled.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AutoCouponConfig;

/// Whether a hook observes (action) or transforms a value (filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    Action,
    Filter,
}

/// Host events the applicator handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEvent {
    /// Plugin texts may be loaded.
    TextsReady,
    /// Coupon options form is being rendered.
    CouponOptions,
    /// Coupon options form was submitted.
    CouponOptionsSave,
    /// A cell of the coupon list is being rendered.
    CouponListColumn,
    /// Cart totals were recalculated.
    CartTotalsCalculated,
    /// Order totals are about to be recalculated.
    OrderBeforeCalculateTotals,
    /// HTML of a coupon row in the cart totals.
    CartCouponHtml,
    /// Label of a coupon row in the cart totals.
    CartCouponLabel,
}

impl HostEvent {
    /// Every event, in registration order.
    pub const ALL: [Self; 8] = [
        Self::TextsReady,
        Self::CouponOptions,
        Self::CouponOptionsSave,
        Self::CouponListColumn,
        Self::CartTotalsCalculated,
        Self::OrderBeforeCalculateTotals,
        Self::CartCouponHtml,
        Self::CartCouponLabel,
    ];

    /// The host's name for this event.
    #[must_use]
    pub const fn host_name(self) -> &'static str {
        match self {
            Self::TextsReady => "plugins_loaded",
            Self::CouponOptions => "woocommerce_coupon_options",
            Self::CouponOptionsSave => "woocommerce_coupon_options_save",
            Self::CouponListColumn => "manage_shop_coupon_posts_custom_column",
            Self::CartTotalsCalculated => "woocommerce_after_calculate_totals",
            Self::OrderBeforeCalculateTotals => "woocommerce_order_before_calculate_totals",
            Self::CartCouponHtml => "woocommerce_cart_totals_coupon_html",
            Self::CartCouponLabel => "woocommerce_cart_totals_coupon_label",
        }
    }

    #[must_use]
    pub const fn kind(self) -> HookKind {
        match self {
            Self::CartCouponHtml | Self::CartCouponLabel => HookKind::Filter,
            _ => HookKind::Action,
        }
    }

    /// Handler priority; lower runs earlier.
    #[must_use]
    pub const fn priority(self) -> i32 {
        match self {
            // After other plugins have added their own column content.
            Self::CouponListColumn => 100,
            _ => 10,
        }
    }

    /// Number of arguments the handler takes.
    #[must_use]
    pub const fn accepted_args(self) -> u8 {
        match self {
            Self::TextsReady | Self::CartTotalsCalculated => 1,
            Self::CartCouponHtml => 3,
            _ => 2,
        }
    }
}

/// One (event, handler) registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hook {
    pub event: HostEvent,
    pub kind: HookKind,
    pub priority: i32,
    pub accepted_args: u8,
}

impl From<HostEvent> for Hook {
    fn from(event: HostEvent) -> Self {
        Self {
            event,
            kind: event.kind(),
            priority: event.priority(),
            accepted_args: event.accepted_args(),
        }
    }
}

/// The host's hook registry.
pub trait HookRegistry {
    fn add(&mut self, hook: Hook);
}

impl HookRegistry for Vec<Hook> {
    fn add(&mut self, hook: Hook) {
        self.push(hook);
    }
}

/// Register every handler with the host. Returns how many were registered.
pub fn register_hooks(config: &AutoCouponConfig, registry: &mut dyn HookRegistry) -> usize {
    if !config.coupons_enabled {
        info!("Coupons are disabled, auto-apply hooks not registered");
        return 0;
    }
    for event in HostEvent::ALL {
        debug!(hook = event.host_name(), priority = event.priority(), "Registering hook");
        registry.add(Hook::from(event));
    }
    HostEvent::ALL.len()
}
