//! # Tax Arithmetic
//!
//! Turns an amount and a resolved rate into a tax amount.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EXCLUSIVE (price + tax)           INCLUSIVE (price contains tax)       │
//! │  ────────────────────────          ──────────────────────────────       │
//! │  $100.00 at 8%                     $108.00 at 8%                        │
//! │  tax = 100 × 0.08                  pre-tax = 108 / 1.08 = 100           │
//! │      = $8.00                       tax = 108 − 100 = $8.00              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No rounding happens here. Rounding to the currency's minor unit is the
//! caller's job.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::resolver::RATE_PRECISION;
use crate::types::TaxMode;

/// Calculates the tax portion of `amount` at `rate` (a unit fraction).
///
/// An inclusive rate of exactly `-1` has no pre-tax price and yields zero.
///
/// ## Example
/// ```rust
/// use product_taxes_core::{calculate_tax, TaxMode};
/// use rust_decimal::Decimal;
///
/// let rate = Decimal::new(8, 2); // 0.08
/// let tax = calculate_tax(Decimal::from(100), rate, TaxMode::Exclusive);
/// assert_eq!(tax, Decimal::from(8));
///
/// let tax = calculate_tax(Decimal::from(108), rate, TaxMode::Inclusive);
/// assert_eq!(tax, Decimal::from(8));
/// ```
pub fn calculate_tax(amount: Decimal, rate: Decimal, mode: TaxMode) -> Decimal {
    match mode {
        TaxMode::Inclusive => match amount.checked_div(Decimal::ONE + rate) {
            Some(pre_tax) => amount - pre_tax,
            None => Decimal::ZERO,
        },
        TaxMode::Exclusive => amount * rate,
    }
}

/// Formats a unit-fraction rate as a percentage label.
///
/// The percentage keeps at most four decimal places and drops trailing
/// zeros: `0.065` → `"6.5%"`, `0.0725` → `"7.25%"`, `0` → `"0%"`.
pub fn format_rate(rate: Decimal) -> String {
    let percentage = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(RATE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    format!("{}%", percentage)
}
