//! # Product Eligibility
//!
//! Decides whether a product is charged product tax rates instead of the
//! platform's default rate.
//!
//! ## Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  custom rate flag ── OR ── in a product-tax category ──┐                │
//! │                                                        │                │
//! │  integrations enabled? ──┬── service flag / category ──┼── OR ──► bool  │
//! │                          └── shipping flag ────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Service and shipping only count when the matching extension is active
//! and `disable_integrations` is off.

use crate::types::{CategoryId, Integrations, ProductTaxFlags, ProductTaxSettings};

/// Eligibility from the three base facts.
///
/// `integrations_disabled` suppresses the service and shipping facts.
#[inline]
pub fn is_product_tax_eligible(
    custom_tax_rate: bool,
    is_service: bool,
    shipping_enabled: bool,
    integrations_disabled: bool,
) -> bool {
    custom_tax_rate || (!integrations_disabled && (is_service || shipping_enabled))
}

/// Full classification of a product against the current settings.
pub fn product_has_product_taxes(
    product: &ProductTaxFlags,
    settings: &ProductTaxSettings,
    integrations: Integrations,
) -> bool {
    let custom = has_custom_rates(product, &settings.product_tax_categories);
    let service = integrations.services && is_service(product, &settings.service_categories);
    let shipping = integrations.shipping && product.shipping_enabled;

    is_product_tax_eligible(custom, service, shipping, settings.disable_integrations)
}

/// Custom rate flag, or membership in any product-tax category.
pub fn has_custom_rates(product: &ProductTaxFlags, categories: &[CategoryId]) -> bool {
    product.custom_tax_rate || in_any(&product.categories, categories)
}

/// Service flag, or membership in any service category.
pub fn is_service(product: &ProductTaxFlags, service_categories: &[CategoryId]) -> bool {
    product.service_enabled || in_any(&product.categories, service_categories)
}

fn in_any(product_categories: &[CategoryId], configured: &[CategoryId]) -> bool {
    product_categories.iter().any(|id| configured.contains(id))
}
