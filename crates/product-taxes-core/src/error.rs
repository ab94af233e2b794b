//! # Error Types
//!
//! Domain-specific error types for product-taxes-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  product-taxes-core errors (this file)                                 │
//! │  ├── TaxError         - Rate table / settings contract violations      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  product-taxes-config errors (separate crate)                          │
//! │  └── ConfigError      - File, TOML and environment failures            │
//! │                                                                         │
//! │  Flow: ValidationError → TaxError → ConfigError → operator             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution itself never fails. Errors only exist at the boundary where
//! loosely-typed admin input becomes a typed rate table.

use thiserror::Error;

// =============================================================================
// Tax Error
// =============================================================================

/// Errors raised while turning admin input into configuration.
#[derive(Debug, Error)]
pub enum TaxError {
    /// A rate row at the given position failed validation.
    #[error("Rate row {row}: {source}")]
    InvalidRateRow {
        row: usize,
        #[source]
        source: ValidationError,
    },

    /// The persisted rate table could not be decoded.
    #[error("Malformed rate table: {0}")]
    MalformedRateTable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for TaxError {
    fn from(err: serde_json::Error) -> Self {
        TaxError::MalformedRateTable(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value is not a decimal number.
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    /// Invalid format (e.g. lowercase or over-long country code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with TaxError.
pub type TaxResult<T> = Result<T, TaxError>;
