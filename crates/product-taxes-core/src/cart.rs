//! # Cart Pricing Hooks
//!
//! The points where the host checkout asks for product taxes: per cart
//! line, per fee, for the tax label, for the displayed rate, and for
//! commission payouts.
//!
//! ## Call Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Host Checkout Pipeline                               │
//! │                                                                         │
//! │  cart line ──► ProductTaxes::cart_item_tax()                            │
//! │                   │                                                     │
//! │                   ├── exempt?          → 0                              │
//! │                   ├── eligible?        → product rate × subtotal        │
//! │                   └── otherwise        → platform tax (unchanged)       │
//! │                                                                         │
//! │  fees ──────► ProductTaxes::fee_tax()          (enable_fee_taxes)       │
//! │  label ─────► ProductTaxes::tax_description()                           │
//! │  rate ──────► ProductTaxes::platform_rate()                             │
//! │  payout ────► ProductTaxes::commission_price() (mitigate_tax_liability) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `enable_product_taxes` off, every hook hands the platform's own
//! value back untouched.

use rust_decimal::Decimal;
use tracing::debug;

use crate::eligibility::product_has_product_taxes;
use crate::resolver::{resolve_rate_with, RateFilter};
use crate::tax::{calculate_tax, format_rate};
use crate::types::{CartFee, Integrations, Location, ProductTaxFlags, ProductTaxSettings, TaxMode};

/// Platform-wide checkout switches the product tax hooks depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checkout {
    /// The platform charges tax at all.
    pub taxes_enabled: bool,

    /// Whether catalogue prices already contain tax.
    pub mode: TaxMode,

    /// Checkout shows prices including tax. Only changes label wording.
    pub show_tax_inclusive: bool,
}

/// Product tax hooks bound to one settings snapshot.
pub struct ProductTaxes<'a> {
    settings: &'a ProductTaxSettings,
    integrations: Integrations,
    checkout: Checkout,
    filter: Option<&'a RateFilter>,
}

impl<'a> ProductTaxes<'a> {
    pub fn new(settings: &'a ProductTaxSettings, integrations: Integrations, checkout: Checkout) -> Self {
        ProductTaxes {
            settings,
            integrations,
            checkout,
            filter: None,
        }
    }

    /// Installs a rate post-processing hook.
    pub fn with_filter(mut self, filter: &'a RateFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn is_active(&self) -> bool {
        self.settings.enable_product_taxes
    }

    pub fn settings(&self) -> &ProductTaxSettings {
        self.settings
    }

    /// Does `product` use product tax rates?
    pub fn applies_to(&self, product: &ProductTaxFlags) -> bool {
        product_has_product_taxes(product, self.settings, self.integrations)
    }

    /// The product tax rate for `location`, as a unit fraction.
    pub fn rate(&self, location: &Location) -> Decimal {
        resolve_rate_with(
            location,
            &self.settings.product_tax_rates,
            self.settings.product_tax_rate,
            self.filter,
        )
    }

    /// Product tax on `amount` for `location` in the given pricing mode.
    ///
    /// Zero when the platform has taxes switched off or the amount is not
    /// positive.
    pub fn product_tax(&self, amount: Decimal, location: &Location, mode: TaxMode) -> Decimal {
        if !self.checkout.taxes_enabled || amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        calculate_tax(amount, self.rate(location), mode)
    }

    /// Tax for one cart line.
    ///
    /// `platform_tax` is what the platform computed with its own rate; it
    /// is returned for products that do not use product tax rates.
    pub fn cart_item_tax(
        &self,
        product: &ProductTaxFlags,
        subtotal: Decimal,
        location: &Location,
        platform_tax: Decimal,
    ) -> Decimal {
        if !self.is_active() {
            return platform_tax;
        }

        if product.tax_exempt {
            return Decimal::ZERO;
        }

        let tax = if self.applies_to(product) {
            let tax = self.product_tax(subtotal, location, self.checkout.mode);
            debug!(
                country = %location.country,
                state = %location.state,
                %subtotal,
                %tax,
                "product tax applied to cart item"
            );
            tax
        } else {
            platform_tax
        };

        tax.max(Decimal::ZERO)
    }

    /// Tax for all fee lines.
    ///
    /// Fees are always treated as tax-exclusive. Fees flagged `no_tax` and
    /// negative fees (discounts) are skipped.
    pub fn fee_tax(&self, fees: &[CartFee], location: &Location, platform_tax: Decimal) -> Decimal {
        if !self.is_active() || !self.settings.enable_fee_taxes {
            return platform_tax;
        }

        fees.iter()
            .filter(|fee| !fee.no_tax && fee.amount >= Decimal::ZERO)
            .map(|fee| self.product_tax(fee.amount, location, TaxMode::Exclusive))
            .sum()
    }

    /// Checkout label for an eligible cart line, e.g. `" – includes 6.5% tax"`.
    ///
    /// `None` means the platform's own label stays.
    pub fn tax_description(&self, product: &ProductTaxFlags, location: &Location) -> Option<String> {
        if !self.is_active() || !self.applies_to(product) {
            return None;
        }

        let verb = if self.checkout.show_tax_inclusive { "includes" } else { "excludes" };
        Some(format!(
            "\u{a0}\u{2013}\u{a0}{} {} tax",
            verb,
            format_rate(self.rate(location))
        ))
    }

    /// The rate the platform should display or apply for `product`.
    pub fn platform_rate(&self, platform_rate: Decimal, product: &ProductTaxFlags, location: &Location) -> Decimal {
        if self.is_active() && self.applies_to(product) {
            self.rate(location)
        } else {
            platform_rate
        }
    }

    /// Commissionable price of a cart line.
    ///
    /// With `mitigate_tax_liability` on (and the commissions extension
    /// active), the line's tax is handed to the recipient as well.
    pub fn commission_price(&self, product: &ProductTaxFlags, price: Decimal, tax: Decimal) -> Decimal {
        let mitigate = self.is_active()
            && self.integrations.commissions
            && self.settings.mitigate_tax_liability;

        if mitigate && self.applies_to(product) {
            price + tax
        } else {
            price
        }
    }
}

impl std::fmt::Debug for ProductTaxes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductTaxes")
            .field("settings", self.settings)
            .field("integrations", &self.integrations)
            .field("checkout", &self.checkout)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RateRule;
    use rust_decimal_macros::dec;

    fn settings() -> ProductTaxSettings {
        ProductTaxSettings {
            enable_product_taxes: true,
            enable_fee_taxes: true,
            mitigate_tax_liability: true,
            product_tax_rate: dec!(10),
            product_tax_rates: vec![RateRule::state("US", "CA", dec!(7.25))].into(),
            ..Default::default()
        }
    }

    fn checkout() -> Checkout {
        Checkout {
            taxes_enabled: true,
            mode: TaxMode::Exclusive,
            show_tax_inclusive: false,
        }
    }

    fn eligible() -> ProductTaxFlags {
        ProductTaxFlags {
            custom_tax_rate: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_eligible_item_uses_product_rate() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());

        let tax = taxes.cart_item_tax(&eligible(), dec!(100), &Location::new("US", "CA"), dec!(1));
        assert_eq!(tax, dec!(7.25));
    }

    #[test]
    fn test_other_item_keeps_platform_tax() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());

        let tax = taxes.cart_item_tax(
            &ProductTaxFlags::default(),
            dec!(100),
            &Location::new("US", "CA"),
            dec!(3.5),
        );
        assert_eq!(tax, dec!(3.5));
    }

    #[test]
    fn test_exempt_item_is_untaxed() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());
        let product = ProductTaxFlags {
            tax_exempt: true,
            ..eligible()
        };

        let tax = taxes.cart_item_tax(&product, dec!(100), &Location::new("US", "CA"), dec!(3));
        assert!(tax.is_zero());
    }

    #[test]
    fn test_negative_platform_tax_clamped() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());

        let tax = taxes.cart_item_tax(&ProductTaxFlags::default(), dec!(100), &Location::default(), dec!(-2));
        assert!(tax.is_zero());
    }

    #[test]
    fn test_master_switch_off_is_passthrough() {
        let settings = ProductTaxSettings {
            enable_product_taxes: false,
            ..settings()
        };
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());
        let location = Location::new("US", "CA");

        assert_eq!(taxes.cart_item_tax(&eligible(), dec!(100), &location, dec!(4)), dec!(4));
        assert_eq!(taxes.platform_rate(dec!(0.04), &eligible(), &location), dec!(0.04));
        assert!(taxes.tax_description(&eligible(), &location).is_none());
    }

    #[test]
    fn test_taxes_disabled_on_platform() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, Checkout::default());

        assert!(taxes.product_tax(dec!(100), &Location::new("US", "CA"), TaxMode::Exclusive).is_zero());
    }

    #[test]
    fn test_inclusive_pricing_back_calculates() {
        let settings = settings();
        let checkout = Checkout {
            mode: TaxMode::Inclusive,
            ..checkout()
        };
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout);

        let tax = taxes.cart_item_tax(&eligible(), dec!(110), &Location::new("FR", ""), dec!(0));
        assert_eq!(tax, dec!(10));
    }

    #[test]
    fn test_fee_tax_skips_untaxed_and_negative_fees() {
        let settings = settings();
        let checkout = Checkout {
            mode: TaxMode::Inclusive,
            ..checkout()
        };
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout);
        let fees = vec![
            CartFee { amount: dec!(20), no_tax: false },
            CartFee { amount: dec!(50), no_tax: true },
            CartFee { amount: dec!(-5), no_tax: false },
        ];

        let tax = taxes.fee_tax(&fees, &Location::new("DE", ""), dec!(99));
        assert_eq!(tax, dec!(2));
    }

    #[test]
    fn test_fee_tax_disabled_keeps_platform_value() {
        let settings = ProductTaxSettings {
            enable_fee_taxes: false,
            ..settings()
        };
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());
        let fees = vec![CartFee { amount: dec!(20), no_tax: false }];

        assert_eq!(taxes.fee_tax(&fees, &Location::default(), dec!(1.5)), dec!(1.5));
    }

    #[test]
    fn test_tax_description_follows_checkout_display() {
        let settings = settings();
        let location = Location::new("US", "CA");

        let exclusive = ProductTaxes::new(&settings, Integrations::ALL, checkout());
        assert_eq!(
            exclusive.tax_description(&eligible(), &location).as_deref(),
            Some("\u{a0}\u{2013}\u{a0}excludes 7.25% tax")
        );

        let inclusive_display = Checkout {
            show_tax_inclusive: true,
            ..checkout()
        };
        let inclusive = ProductTaxes::new(&settings, Integrations::ALL, inclusive_display);
        assert_eq!(
            inclusive.tax_description(&eligible(), &location).as_deref(),
            Some("\u{a0}\u{2013}\u{a0}includes 7.25% tax")
        );
        assert!(inclusive
            .tax_description(&ProductTaxFlags::default(), &location)
            .is_none());
    }

    #[test]
    fn test_platform_rate_override() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());
        let location = Location::new("US", "CA");

        assert_eq!(taxes.platform_rate(dec!(0.2), &eligible(), &location), dec!(0.0725));
        assert_eq!(taxes.platform_rate(dec!(0.2), &ProductTaxFlags::default(), &location), dec!(0.2));
    }

    #[test]
    fn test_commission_price() {
        let settings = settings();
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout());

        assert_eq!(taxes.commission_price(&eligible(), dec!(40), dec!(4)), dec!(44));
        assert_eq!(taxes.commission_price(&ProductTaxFlags::default(), dec!(40), dec!(4)), dec!(40));

        let without_extension = ProductTaxes::new(&settings, Integrations::NONE, checkout());
        assert_eq!(without_extension.commission_price(&eligible(), dec!(40), dec!(4)), dec!(40));
    }

    #[test]
    fn test_filter_applies_to_every_hook() {
        let settings = settings();
        let zero: &RateFilter = &|_: Decimal, _: &Location| Decimal::ZERO;
        let taxes = ProductTaxes::new(&settings, Integrations::ALL, checkout()).with_filter(zero);
        let location = Location::new("US", "CA");

        assert!(taxes.cart_item_tax(&eligible(), dec!(100), &location, dec!(5)).is_zero());
        assert!(taxes.platform_rate(dec!(0.2), &eligible(), &location).is_zero());
    }
}
