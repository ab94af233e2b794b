//! # Domain Types
//!
//! Core domain types used throughout Product Taxes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    RateRule     │   │    Location     │   │ ProductTaxSettings  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  country        │   │  switches           │   │
//! │  │  country        │   │  state          │   │  fallback rate      │   │
//! │  │  state / global │   └─────────────────┘   │  RateTable          │   │
//! │  │  rate (% opt)   │                         │  categories         │   │
//! │  └─────────────────┘   ┌─────────────────┐   └─────────────────────┘   │
//! │                        │ ProductTaxFlags │   ┌─────────────────────┐   │
//! │  ┌─────────────────┐   │  ─────────────  │   │      TaxMode        │   │
//! │  │   RateTable     │   │  custom rates   │   │  Exclusive          │   │
//! │  │  Vec<RateRule>  │   │  shipping       │   │  Inclusive          │   │
//! │  │  ordered        │   │  service        │   └─────────────────────┘   │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentages are stored the way an admin types them (`6.5` means 6.5%).
//! Only the resolver converts them to unit fractions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Location
// =============================================================================

/// A customer location, already resolved by the caller.
///
/// Empty strings mean "unknown". An empty country never matches any rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// ISO 3166-1 alpha-2 country code, e.g. `US`.
    #[serde(default)]
    pub country: String,

    /// Region or province code, e.g. `CA`.
    #[serde(default)]
    pub state: String,
}

impl Location {
    pub fn new(country: impl Into<String>, state: impl Into<String>) -> Self {
        Location {
            country: country.into(),
            state: state.into(),
        }
    }

    /// A location known only by country.
    pub fn in_country(country: impl Into<String>) -> Self {
        Location::new(country, "")
    }

    pub fn has_country(&self) -> bool {
        !self.country.is_empty()
    }
}

// =============================================================================
// Rate Rule
// =============================================================================

/// One configured (country, state, global, rate) row.
///
/// ## Matching
/// - `global = true`: every state of `country`
/// - `global = false`: only `state` (case-insensitive); an empty `state`
///   never matches anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    /// Row identifier assigned when the table is saved.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub country: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub global: bool,

    /// Percentage, e.g. `7.25`. A row without a rate is a no-op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
}

impl RateRule {
    /// A rule covering a whole country.
    pub fn global(country: impl Into<String>, rate: Decimal) -> Self {
        RateRule {
            id: Uuid::new_v4(),
            country: country.into(),
            state: String::new(),
            global: true,
            rate: Some(rate),
        }
    }

    /// A rule covering a single state of a country.
    pub fn state(country: impl Into<String>, state: impl Into<String>, rate: Decimal) -> Self {
        RateRule {
            id: Uuid::new_v4(),
            country: country.into(),
            state: state.into(),
            global: false,
            rate: Some(rate),
        }
    }

    /// Drops the rate, turning the row into a no-op.
    pub fn without_rate(mut self) -> Self {
        self.rate = None;
        self
    }
}

// =============================================================================
// Rate Table
// =============================================================================

/// Ordered rate rules. Later rows override earlier ones during lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable(Vec<RateRule>);

impl RateTable {
    pub fn new() -> Self {
        RateTable(Vec::new())
    }

    pub fn push(&mut self, rule: RateRule) {
        self.0.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RateRule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rules(&self) -> &[RateRule] {
        &self.0
    }

    /// Decodes the typed JSON row list (`[{"country": "US", ...}]`).
    pub fn from_json(json: &str) -> crate::TaxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Vec<RateRule>> for RateTable {
    fn from(rules: Vec<RateRule>) -> Self {
        RateTable(rules)
    }
}

impl FromIterator<RateRule> for RateTable {
    fn from_iter<I: IntoIterator<Item = RateRule>>(iter: I) -> Self {
        RateTable(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RateTable {
    type Item = &'a RateRule;
    type IntoIter = std::slice::Iter<'a, RateRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Tax Mode
// =============================================================================

/// Whether listed prices already contain tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Price + tax shown separately (USA model).
    #[default]
    Exclusive,
    /// Price includes tax (EU/UK model).
    Inclusive,
}

impl TaxMode {
    pub fn from_prices_include_tax(prices_include_tax: bool) -> Self {
        if prices_include_tax {
            TaxMode::Inclusive
        } else {
            TaxMode::Exclusive
        }
    }

    pub fn prices_include_tax(&self) -> bool {
        matches!(self, TaxMode::Inclusive)
    }
}

// =============================================================================
// Product Flags
// =============================================================================

/// Category (taxonomy term) identifier.
pub type CategoryId = u64;

/// Per-product facts read by the classifier.
///
/// Every field is supplied by the host platform; this crate never looks
/// anything up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTaxFlags {
    /// "Custom tax rate" checkbox on the product.
    #[serde(default)]
    pub custom_tax_rate: bool,

    /// Shipping is enabled for the product.
    #[serde(default)]
    pub shipping_enabled: bool,

    /// Product is sold as a service.
    #[serde(default)]
    pub service_enabled: bool,

    /// Product is exempt from tax altogether.
    #[serde(default)]
    pub tax_exempt: bool,

    /// Categories the product belongs to.
    #[serde(default)]
    pub categories: Vec<CategoryId>,
}

/// Which optional host integrations are installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrations {
    /// The "sell as service" extension is active.
    #[serde(default)]
    pub services: bool,

    /// The shipping extension is active.
    #[serde(default)]
    pub shipping: bool,

    /// The commissions extension is active.
    #[serde(default)]
    pub commissions: bool,
}

impl Integrations {
    pub const ALL: Integrations = Integrations {
        services: true,
        shipping: true,
        commissions: true,
    };

    pub const NONE: Integrations = Integrations {
        services: false,
        shipping: false,
        commissions: false,
    };
}

// =============================================================================
// Cart Fee
// =============================================================================

/// A fee line in the cart (handling, surcharge, discount...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartFee {
    pub amount: Decimal,

    /// Fee was explicitly marked as not taxable.
    #[serde(default)]
    pub no_tax: bool,
}

// =============================================================================
// Settings
// =============================================================================

/// Product tax configuration, as persisted by the settings store.
///
/// ## Example (TOML)
/// ```toml
/// enable_product_taxes = true
/// product_tax_rate = "6.5"
/// product_tax_categories = [12, 40]
///
/// [[product_tax_rates]]
/// country = "US"
/// state = "CA"
/// rate = "7.25"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTaxSettings {
    /// Master switch.
    #[serde(default)]
    pub enable_product_taxes: bool,

    /// Apply product tax rates to fee lines too.
    #[serde(default)]
    pub enable_fee_taxes: bool,

    /// Pass the item tax on to commission recipients.
    #[serde(default)]
    pub mitigate_tax_liability: bool,

    /// Ignore service/shipping flags when deciding eligibility.
    #[serde(default)]
    pub disable_integrations: bool,

    /// Fallback percentage used when no rule matches.
    #[serde(default)]
    pub product_tax_rate: Decimal,

    /// Members of these categories always get product tax rates.
    #[serde(default)]
    pub product_tax_categories: Vec<CategoryId>,

    /// Members of these categories count as services.
    #[serde(default)]
    pub service_categories: Vec<CategoryId>,

    /// Location-specific rates.
    #[serde(default)]
    pub product_tax_rates: RateTable,
}
