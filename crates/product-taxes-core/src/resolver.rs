//! # Rate Resolver
//!
//! Turns a location and a rate table into the unit-fraction rate to apply.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        resolve_rate()                                   │
//! │                                                                         │
//! │  selected = fallback                                                    │
//! │       │                                                                 │
//! │       ├── country empty? ──────────────────────────────┐                │
//! │       │                                                │                │
//! │       ▼                                                │                │
//! │  for rule in table (in order, no early exit)           │                │
//! │       ├── other country?            → skip             │                │
//! │       ├── global + non-zero rate    → selected = rate  │                │
//! │       ├── empty / other state       → skip             │                │
//! │       └── state match + rate        → selected = rate  │                │
//! │       │                                                │                │
//! │       ▼                                                ▼                │
//! │  selected / 100 ──► filter (optional) ──► rate                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The last matching row wins. A later global row can override an earlier
//! state row for the same country and vice versa; table order is the only
//! tie-break.
//!
//! ## Example
//! ```rust
//! use product_taxes_core::{resolve_rate, Location, RateRule, RateTable};
//! use rust_decimal::Decimal;
//!
//! let table: RateTable = vec![
//!     RateRule::global("US", Decimal::new(5, 0)),
//!     RateRule::state("US", "CA", Decimal::new(725, 2)),
//! ]
//! .into();
//!
//! let rate = resolve_rate(&Location::new("US", "ca"), &table, Decimal::ZERO);
//! assert_eq!(rate, Decimal::new(725, 4)); // 0.0725
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::trace;

use crate::types::{Location, RateRule, RateTable};

/// Decimal places kept on a configured percentage.
pub const RATE_PRECISION: u32 = 4;

/// Post-processing hook applied to every resolved rate.
pub type RateFilter = dyn Fn(Decimal, &Location) -> Decimal + Send + Sync;

/// Resolves the rate for `location`, falling back to `fallback_rate`.
///
/// `fallback_rate` and the rule rates are percentages; the result is a
/// unit fraction (`6.5` → `0.065`).
pub fn resolve_rate(location: &Location, table: &RateTable, fallback_rate: Decimal) -> Decimal {
    resolve_rate_with(location, table, fallback_rate, None)
}

/// Same as [`resolve_rate`], passing the result through `filter`.
pub fn resolve_rate_with(
    location: &Location,
    table: &RateTable,
    fallback_rate: Decimal,
    filter: Option<&RateFilter>,
) -> Decimal {
    let selected = select_percentage(location, table).unwrap_or(fallback_rate);
    let rate = selected / Decimal::ONE_HUNDRED;

    match filter {
        Some(filter) => filter(rate, location),
        None => rate,
    }
}

/// Percentage of the last matching rule, if any rule matched.
fn select_percentage(location: &Location, table: &RateTable) -> Option<Decimal> {
    if !location.has_country() {
        return None;
    }

    let mut selected = None;

    for rule in table {
        if rule.country != location.country {
            continue;
        }

        if let Some(rate) = rule_percentage(rule, &location.state) {
            trace!(
                rule_id = %rule.id,
                country = %rule.country,
                state = %rule.state,
                global = rule.global,
                %rate,
                "rate rule applied"
            );
            selected = Some(rate);
        }
    }

    selected
}

/// The percentage a same-country rule contributes for `state`.
///
/// Global rows with a zero rate are ignored, state rows with a zero rate
/// are not.
fn rule_percentage(rule: &RateRule, state: &str) -> Option<Decimal> {
    let rate = rule.rate?;

    if rule.global {
        return (!rate.is_zero()).then(|| round_percentage(rate));
    }

    if rule.state.is_empty() || rule.state.to_lowercase() != state.to_lowercase() {
        return None;
    }

    Some(round_percentage(rate))
}

fn round_percentage(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Resolver
// =============================================================================

/// A rate table and fallback bundled with an optional filter.
///
/// Borrowing from a settings snapshot keeps every lookup made through one
/// resolver on the same configuration.
pub struct RateResolver<'a> {
    table: &'a RateTable,
    fallback_rate: Decimal,
    filter: Option<Box<RateFilter>>,
}

impl<'a> RateResolver<'a> {
    pub fn new(table: &'a RateTable, fallback_rate: Decimal) -> Self {
        RateResolver {
            table,
            fallback_rate,
            filter: None,
        }
    }

    /// Installs a post-processing hook, replacing any previous one.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Decimal, &Location) -> Decimal + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn fallback_rate(&self) -> Decimal {
        self.fallback_rate
    }

    pub fn resolve(&self, location: &Location) -> Decimal {
        resolve_rate_with(location, self.table, self.fallback_rate, self.filter.as_deref())
    }
}

impl std::fmt::Debug for RateResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateResolver")
            .field("rules", &self.table.len())
            .field("fallback_rate", &self.fallback_rate)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn us_table() -> RateTable {
        vec![
            RateRule::global("US", dec!(5.0)),
            RateRule::state("US", "CA", dec!(7.25)),
        ]
        .into()
    }

    #[test]
    fn test_empty_table_uses_fallback() {
        let table = RateTable::new();
        let rate = resolve_rate(&Location::new("US", "CA"), &table, dec!(6.5));
        assert_eq!(rate, dec!(0.065));
    }

    #[test]
    fn test_empty_country_uses_fallback() {
        let rate = resolve_rate(&Location::new("", "CA"), &us_table(), dec!(3));
        assert_eq!(rate, dec!(0.03));
    }

    #[test]
    fn test_later_state_rule_wins() {
        let rate = resolve_rate(&Location::new("US", "CA"), &us_table(), dec!(0));
        assert_eq!(rate, dec!(0.0725));
    }

    #[test]
    fn test_later_global_rule_wins() {
        let table: RateTable = vec![
            RateRule::state("US", "CA", dec!(7.25)),
            RateRule::global("US", dec!(5.0)),
        ]
        .into();

        let rate = resolve_rate(&Location::new("US", "CA"), &table, dec!(0));
        assert_eq!(rate, dec!(0.05));
    }

    #[test]
    fn test_global_rule_covers_other_states() {
        let rate = resolve_rate(&Location::new("US", "NY"), &us_table(), dec!(1));
        assert_eq!(rate, dec!(0.05));
    }

    #[test]
    fn test_country_match_is_case_sensitive() {
        let rate = resolve_rate(&Location::new("us", "CA"), &us_table(), dec!(1));
        assert_eq!(rate, dec!(0.01));
    }

    #[test]
    fn test_state_match_is_case_insensitive() {
        let table: RateTable = vec![RateRule::state("US", "CA", dec!(7.25))].into();
        let rate = resolve_rate(&Location::new("US", "ca"), &table, dec!(0));
        assert_eq!(rate, dec!(0.0725));
    }

    #[test]
    fn test_state_rule_without_state_never_matches() {
        let table: RateTable = vec![RateRule::state("US", "", dec!(9))].into();

        assert_eq!(resolve_rate(&Location::new("US", ""), &table, dec!(2)), dec!(0.02));
        assert_eq!(resolve_rate(&Location::new("US", "CA"), &table, dec!(2)), dec!(0.02));
    }

    #[test]
    fn test_zero_global_rate_does_not_override() {
        let table: RateTable = vec![
            RateRule::state("US", "CA", dec!(7.25)),
            RateRule::global("US", dec!(0)),
        ]
        .into();

        let rate = resolve_rate(&Location::new("US", "CA"), &table, dec!(1));
        assert_eq!(rate, dec!(0.0725));
    }

    #[test]
    fn test_zero_state_rate_overrides() {
        let table: RateTable = vec![
            RateRule::global("US", dec!(5)),
            RateRule::state("US", "OR", dec!(0)),
        ]
        .into();

        let rate = resolve_rate(&Location::new("US", "OR"), &table, dec!(1));
        assert_eq!(rate, Decimal::ZERO);
    }

    #[test]
    fn test_rows_without_rate_are_noops() {
        let table: RateTable = vec![
            RateRule::global("US", dec!(5)),
            RateRule::state("US", "CA", dec!(7)).without_rate(),
            RateRule::global("US", dec!(6)).without_rate(),
        ]
        .into();

        let rate = resolve_rate(&Location::new("US", "CA"), &table, dec!(1));
        assert_eq!(rate, dec!(0.05));
    }

    #[test]
    fn test_rule_rate_rounded_to_four_places() {
        let table: RateTable = vec![RateRule::global("DE", dec!(19.123456))].into();
        let rate = resolve_rate(&Location::in_country("DE"), &table, dec!(0));
        assert_eq!(rate, dec!(0.19123500));
    }

    #[test]
    fn test_filter_post_processes_rate() {
        let table = us_table();
        let double: &RateFilter = &|rate: Decimal, _: &Location| rate * dec!(2);
        let rate = resolve_rate_with(&Location::new("US", "CA"), &table, dec!(0), Some(double));
        assert_eq!(rate, dec!(0.145));
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let table = us_table();
        let resolver = RateResolver::new(&table, dec!(4));
        let location = Location::new("US", "CA");

        assert_eq!(resolver.resolve(&location), resolver.resolve(&location));
    }

    #[test]
    fn test_resolver_filter_sees_location() {
        let table = us_table();
        let resolver = RateResolver::new(&table, dec!(4)).with_filter(|rate, location| {
            if location.country == "US" {
                rate
            } else {
                Decimal::ZERO
            }
        });

        assert_eq!(resolver.resolve(&Location::new("FR", "")), Decimal::ZERO);
        assert_eq!(resolver.resolve(&Location::new("US", "WA")), dec!(0.05));
    }
}
