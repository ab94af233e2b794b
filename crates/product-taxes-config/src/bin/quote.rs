//! # Tax Quote
//!
//! Prints the product tax rate and amount for one location, using the
//! saved settings.
//!
//! ## Usage
//! ```bash
//! # Rate for California with the default settings file
//! cargo run -p product-taxes-config --bin quote -- --country US --state CA
//!
//! # Tax on 120.00 for a product flagged with a custom rate
//! cargo run -p product-taxes-config --bin quote -- --country US --state CA --amount 120 --custom
//!
//! # Explicit settings file
//! cargo run -p product-taxes-config --bin quote -- --config ./product-taxes.toml --country DE
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use product_taxes_config::SettingsStore;
use product_taxes_core::{format_rate, Location, ProductTaxFlags};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,product_taxes=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut country = String::new();
    let mut state = String::new();
    let mut amount = Decimal::ZERO;
    let mut custom = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--country" => {
                if i + 1 < args.len() {
                    country = args[i + 1].clone();
                    i += 1;
                }
            }
            "--state" => {
                if i + 1 < args.len() {
                    state = args[i + 1].clone();
                    i += 1;
                }
            }
            "--amount" | "-a" => {
                if i + 1 < args.len() {
                    amount = Decimal::from_str(&args[i + 1])?;
                    i += 1;
                }
            }
            "--custom" => custom = true,
            "--help" | "-h" => {
                println!("Product Taxes Quote");
                println!();
                println!("Usage: quote [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   Settings file (default: platform config dir)");
                println!("      --country <CODE>  Customer country, e.g. US");
                println!("      --state <CODE>    Customer state, e.g. CA");
                println!("  -a, --amount <N>      Line subtotal to tax (default: 0)");
                println!("      --custom          Treat the product as having a custom tax rate");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let store = SettingsStore::open(config_path)?;
    let snapshot = store.snapshot();
    let taxes = snapshot.product_taxes();

    let location = Location::new(country, state);
    let rate = taxes.rate(&location);

    println!("Product taxes enabled: {}", taxes.is_active());
    println!("Rules configured:      {}", snapshot.settings().product_tax_rates.len());
    println!("Rate:                  {}", format_rate(rate));

    if !amount.is_zero() {
        let product = ProductTaxFlags {
            custom_tax_rate: custom,
            ..Default::default()
        };
        let tax = taxes.cart_item_tax(&product, amount, &location, Decimal::ZERO);
        println!("Tax on {}:             {}", amount, tax.round_dp(2));
    }

    Ok(())
}
