//! # Validation Module
//!
//! Turns loosely-typed admin input into a typed [`RateTable`].
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Settings form / JSON import                                            │
//! │  └── RateRowInput (strings, "1"/"on" checkboxes)                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE: sanitize_rate_rows()                                      │
//! │  ├── blank rows dropped                                                 │
//! │  ├── country must be an ISO alpha-2 code                                │
//! │  ├── rate must be a number in 0..=100 (or empty = no-op row)            │
//! │  └── every row gets a fresh UUID                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  RateTable (typed, replaces the previous table wholesale)               │
//! │                                                                         │
//! │  The resolver never validates: anything reaching it is already typed.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use product_taxes_core::validation::{sanitize_rate_rows, RateRowInput};
//!
//! let rows = RateRowInput::from_json(r#"[
//!     {"country": "US", "state": "CA", "rate": "7.25"},
//!     {"country": "US", "global": "1", "rate": 5}
//! ]"#).unwrap();
//!
//! let table = sanitize_rate_rows(rows).unwrap();
//! assert_eq!(table.len(), 2);
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{TaxError, TaxResult, ValidationError};
use crate::types::{RateRule, RateTable};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Highest accepted percentage.
pub const MAX_RATE_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

// =============================================================================
// Raw Input
// =============================================================================

/// One rate row as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRowInput {
    #[serde(default, deserialize_with = "loose_string")]
    pub country: String,

    #[serde(default, deserialize_with = "loose_string")]
    pub state: String,

    #[serde(default, deserialize_with = "loose_bool")]
    pub global: bool,

    #[serde(default, deserialize_with = "loose_string")]
    pub rate: String,
}

impl RateRowInput {
    /// Decodes a submitted row list.
    ///
    /// Accepts both a JSON array and an object keyed by row id, which is
    /// how form posts arrive; object keys are discarded.
    pub fn from_json(json: &str) -> TaxResult<Vec<RateRowInput>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Rows {
            List(Vec<RateRowInput>),
            Keyed(serde_json::Map<String, serde_json::Value>),
        }

        match serde_json::from_str(json)? {
            Rows::List(rows) => Ok(rows),
            Rows::Keyed(map) => map
                .into_iter()
                .map(|(_, value)| serde_json::from_value(value).map_err(TaxError::from))
                .collect(),
        }
    }

    fn is_blank(&self) -> bool {
        self.country.trim().is_empty() && self.state.trim().is_empty() && self.rate.trim().is_empty()
    }
}

/// Scalars a form field may arrive as.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => String::new(),
        Some(Loose::Text(text)) => text,
        Some(Loose::Int(value)) => value.to_string(),
        Some(Loose::Float(value)) => value.to_string(),
        Some(Loose::Bool(true)) => "1".to_string(),
        Some(Loose::Bool(false)) => String::new(),
    })
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        None => false,
        Some(Loose::Bool(value)) => value,
        Some(Loose::Int(value)) => value != 0,
        Some(Loose::Float(value)) => value != 0.0,
        Some(Loose::Text(text)) => !matches!(text.trim(), "" | "0" | "false" | "off"),
    })
}

// =============================================================================
// Row Validation
// =============================================================================

/// Validates submitted rows and builds a fresh table.
///
/// Row numbers in errors are 1-based positions in `rows`.
pub fn sanitize_rate_rows(rows: Vec<RateRowInput>) -> TaxResult<RateTable> {
    rows.into_iter()
        .enumerate()
        .filter(|(_, row)| !row.is_blank())
        .map(|(index, row)| {
            sanitize_rate_row(row).map_err(|source| TaxError::InvalidRateRow {
                row: index + 1,
                source,
            })
        })
        .collect()
}

/// Validates one submitted row.
pub fn sanitize_rate_row(row: RateRowInput) -> ValidationResult<RateRule> {
    let country = row.country.trim().to_string();
    validate_country_code(&country)?;

    Ok(RateRule {
        id: Uuid::new_v4(),
        country,
        state: row.state.trim().to_string(),
        global: row.global,
        rate: parse_percentage("rate", &row.rate)?,
    })
}

/// Validates an ISO 3166-1 alpha-2 country code.
///
/// ## Example
/// ```rust
/// use product_taxes_core::validation::validate_country_code;
///
/// assert!(validate_country_code("US").is_ok());
/// assert!(validate_country_code("us").is_err());
/// assert!(validate_country_code("").is_err());
/// ```
pub fn validate_country_code(country: &str) -> ValidationResult<()> {
    if country.is_empty() {
        return Err(ValidationError::Required {
            field: "country".to_string(),
        });
    }

    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "country".to_string(),
            reason: "must be a two-letter uppercase ISO code".to_string(),
        });
    }

    Ok(())
}

/// Parses a percentage field. Empty input means "no rate".
pub fn parse_percentage(field: &str, value: &str) -> ValidationResult<Option<Decimal>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let rate = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| ValidationError::NotANumber {
            field: field.to_string(),
            value: value.to_string(),
        })?;

    validate_percentage(field, rate)?;
    Ok(Some(rate))
}

/// Checks a percentage lies in `0..=100`.
pub fn validate_percentage(field: &str, rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate > MAX_RATE_PERCENTAGE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: "0".to_string(),
            max: MAX_RATE_PERCENTAGE.to_string(),
        });
    }

    Ok(())
}

/// Validates the fallback percentage.
pub fn validate_fallback_rate(rate: Decimal) -> ValidationResult<()> {
    validate_percentage("product_tax_rate", rate)
}
