//! CLI subcommands.

pub mod coupons;
pub mod simulate;

use auto_coupon::error::{AutoCouponError, StoreError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Scenario file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    AutoCoupon(#[from] AutoCouponError),
}
