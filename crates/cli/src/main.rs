//! Auto Coupon CLI - Scenario simulation and coupon inspection.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile the cart and/or order of a scenario and log the outcome
//! ac-cli simulate demos/scenario.yaml
//!
//! # List the coupons of a scenario with their auto-apply flag
//! ac-cli coupons demos/scenario.yaml
//! ```
//!
//! # Commands
//!
//! - `simulate` - Run the cart and order handlers against a scenario
//! - `coupons` - List coupons as the admin coupon list would show them
//!
//! Configuration comes from `AUTO_COUPON_*` environment variables (see
//! [`AutoCouponConfig`]); log verbosity from `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use auto_coupon::AutoCouponConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod scenario;

#[derive(Parser)]
#[command(name = "ac-cli")]
#[command(author, version, about = "Auto Coupon CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a scenario's cart and order
    Simulate {
        /// Scenario YAML file
        path: PathBuf,
    },
    /// List a scenario's coupons
    Coupons {
        /// Scenario YAML file
        path: PathBuf,
    },
}

/// Log filter used when `RUST_LOG` is not set. The binary logs under its own
/// crate name, `ac_cli`.
const DEFAULT_LOG_FILTER: &str = "auto_coupon=info,ac_cli=info";

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn main() {
    let config = AutoCouponConfig::from_env();
    init_tracing(config.as_ref().is_ok_and(|c| c.log_json));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: AutoCouponConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Simulate { path } => commands::simulate::run(&path, config)?,
        Commands::Coupons { path } => commands::coupons::run(&path, config)?,
    }
    Ok(())
}
