//! Applicator configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `AUTO_COUPON_COUPONS_ENABLED` - Whether the store uses coupons at all.
//!   Hooks are only registered when enabled (default: yes)
//! - `AUTO_COUPON_META_KEY` - Coupon meta key holding the auto-apply flag
//!   (default: `_auto_coupon_for_woocommerce_auto_apply`)
//! - `AUTO_COUPON_PRICE_DECIMALS` - Decimal places prices are rounded to
//!   (default: 2, max: 8)
//! - `AUTO_COUPON_LOG_JSON` - Emit JSON logs instead of text (default: no)

use auto_coupon_core::Precision;
use thiserror::Error;

/// Meta key the auto-apply flag is stored under.
pub const DEFAULT_META_KEY: &str = "_auto_coupon_for_woocommerce_auto_apply";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Applicator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCouponConfig {
    /// Gate for hook registration
    pub coupons_enabled: bool,
    /// Coupon meta key holding the auto-apply flag
    pub meta_key: String,
    /// Rounding precision for prices, discounts and taxes
    pub precision: Precision,
    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for AutoCouponConfig {
    fn default() -> Self {
        Self {
            coupons_enabled: true,
            meta_key: DEFAULT_META_KEY.to_string(),
            precision: Precision::default(),
            log_json: false,
        }
    }
}

impl AutoCouponConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let coupons_enabled = match lookup("AUTO_COUPON_COUPONS_ENABLED") {
            Some(value) => parse_bool("AUTO_COUPON_COUPONS_ENABLED", &value)?,
            None => defaults.coupons_enabled,
        };

        let meta_key = lookup("AUTO_COUPON_META_KEY")
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.meta_key);
        if meta_key.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "AUTO_COUPON_META_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let precision = match lookup("AUTO_COUPON_PRICE_DECIMALS") {
            Some(value) => parse_precision(&value)?,
            None => defaults.precision,
        };

        let log_json = match lookup("AUTO_COUPON_LOG_JSON") {
            Some(value) => parse_bool("AUTO_COUPON_LOG_JSON", &value)?,
            None => defaults.log_json,
        };

        Ok(Self {
            coupons_enabled,
            meta_key,
            precision,
            log_json,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a yes/no style flag.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Ok(true),
        "no" | "false" | "off" | "0" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected yes/no, got '{other}'"),
        )),
    }
}

fn parse_precision(value: &str) -> Result<Precision, ConfigError> {
    let decimals = value.trim().parse::<u32>().map_err(|e| {
        ConfigError::InvalidEnvVar("AUTO_COUPON_PRICE_DECIMALS".to_string(), e.to_string())
    })?;
    if decimals > Precision::MAX {
        return Err(ConfigError::InvalidEnvVar(
            "AUTO_COUPON_PRICE_DECIMALS".to_string(),
            format!("must be at most {}", Precision::MAX),
        ));
    }
    Ok(Precision::new(decimals))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AutoCouponConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AutoCouponConfig::default());
        assert!(config.coupons_enabled);
        assert_eq!(config.meta_key, DEFAULT_META_KEY);
        assert_eq!(config.precision.decimals(), 2);
    }

    #[test]
    fn test_overrides() {
        let config = AutoCouponConfig::from_lookup(lookup(&[
            ("AUTO_COUPON_COUPONS_ENABLED", "no"),
            ("AUTO_COUPON_META_KEY", " _auto_apply "),
            ("AUTO_COUPON_PRICE_DECIMALS", "3"),
            ("AUTO_COUPON_LOG_JSON", "TRUE"),
        ]))
        .unwrap();
        assert!(!config.coupons_enabled);
        assert_eq!(config.meta_key, "_auto_apply");
        assert_eq!(config.precision.decimals(), 3);
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_flag() {
        let err =
            AutoCouponConfig::from_lookup(lookup(&[("AUTO_COUPON_COUPONS_ENABLED", "maybe")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "AUTO_COUPON_COUPONS_ENABLED"));
    }

    #[test]
    fn test_invalid_precision() {
        assert!(
            AutoCouponConfig::from_lookup(lookup(&[("AUTO_COUPON_PRICE_DECIMALS", "two")]))
                .is_err()
        );
        assert!(
            AutoCouponConfig::from_lookup(lookup(&[("AUTO_COUPON_PRICE_DECIMALS", "12")]))
                .is_err()
        );
    }

    #[test]
    fn test_empty_meta_key() {
        assert!(AutoCouponConfig::from_lookup(lookup(&[("AUTO_COUPON_META_KEY", "  ")])).is_err());
    }
}
