//! # product-taxes-config: Settings Store for Product Taxes
//!
//! Owns the settings file, `PRODUCT_TAXES_*` environment overrides and the
//! live snapshot checkout code reads from.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product-taxes.toml ──► ProductTaxConfig::load ──► SettingsStore        │
//! │        ▲                  (file, env, validate)         │               │
//! │        │                                                ▼               │
//! │   save on update ◄── replace_rates / update      snapshot() ──► core    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod store;

pub use config::{CheckoutSettings, ProductTaxConfig, ENV_PREFIX};
pub use error::{ConfigError, ConfigResult};
pub use store::{SettingsSnapshot, SettingsStore};
