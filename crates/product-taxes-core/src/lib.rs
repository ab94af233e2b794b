//! # product-taxes-core: Pure Tax Logic for Product Taxes
//!
//! This crate applies differentiated tax rates to specific products based
//! on product flags, category membership and customer location. Everything
//! here is a pure function over configuration handed in by the caller.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Product Taxes Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Host Checkout Pipeline (external)               │   │
//! │  │      cart line ──► fee line ──► tax label ──► commission        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ProductTaxes hooks                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ product-taxes-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ resolver  │  │    tax    │  │eligibility│  │ validation│  │   │
//! │  │   │ rate rule │  │ calculate │  │  flags /  │  │ rate rows │  │   │
//! │  │   │  lookup   │  │  format   │  │ categories│  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO GLOBAL STATE • PURE FUNCTIONS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │              product-taxes-config (Settings Store)              │   │
//! │  │            TOML file, env overrides, consistent snapshots       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RateRule, RateTable, Location, settings)
//! - [`resolver`] - Location → rate lookup
//! - [`tax`] - Tax amount arithmetic and rate labels
//! - [`eligibility`] - Which products use product tax rates
//! - [`location`] - Filling in a partial customer location
//! - [`cart`] - Hooks called by the checkout pipeline
//! - [`validation`] - Admin input → typed rate table
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use product_taxes_core::{calculate_tax, resolve_rate, Location, RateRule, RateTable, TaxMode};
//! use rust_decimal::Decimal;
//!
//! let table: RateTable = vec![RateRule::state("US", "CA", Decimal::new(725, 2))].into();
//! let fallback = Decimal::new(5, 0); // 5%
//!
//! let rate = resolve_rate(&Location::new("US", "CA"), &table, fallback);
//! let tax = calculate_tax(Decimal::from(100), rate, TaxMode::Exclusive);
//!
//! assert_eq!(tax, Decimal::new(725, 2)); // 7.25
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod eligibility;
pub mod error;
pub mod location;
pub mod resolver;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Checkout, ProductTaxes};
pub use eligibility::{is_product_tax_eligible, product_has_product_taxes};
pub use error::{TaxError, TaxResult, ValidationError};
pub use location::LocationSources;
pub use resolver::{resolve_rate, resolve_rate_with, RateFilter, RateResolver};
pub use tax::{calculate_tax, format_rate};
pub use types::*;
