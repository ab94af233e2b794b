//! # Location Derivation
//!
//! Fills in a missing country or state from checkout input, the logged-in
//! customer's address, and finally the shop's own address.
//!
//! ## Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  country: explicit → billing_country → customer* → shop                 │
//! │  state:   explicit → state → card_state → customer* → shop              │
//! │                                                                         │
//! │  * only when the customer is logged in                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver never calls this; the checkout layer does, then hands the
//! finished [`Location`] over.

use serde::{Deserialize, Serialize};

use crate::types::Location;

/// Every place a location can come from during checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSources {
    /// Country submitted with the checkout form.
    #[serde(default)]
    pub billing_country: Option<String>,

    /// State submitted with the checkout form.
    #[serde(default)]
    pub billing_state: Option<String>,

    /// State submitted with the card details.
    #[serde(default)]
    pub card_state: Option<String>,

    /// Address on file for the logged-in customer.
    #[serde(default)]
    pub customer: Option<Location>,

    /// The shop's base location.
    #[serde(default)]
    pub shop: Location,
}

impl LocationSources {
    /// Completes `requested`, keeping whichever half the caller supplied.
    pub fn resolve(&self, requested: Option<&Location>) -> Location {
        let requested_country = requested.map(|l| l.country.as_str()).unwrap_or_default();
        let requested_state = requested.map(|l| l.state.as_str()).unwrap_or_default();

        let customer = self.customer.as_ref();

        let country = first_non_empty(&[
            Some(requested_country),
            self.billing_country.as_deref(),
            customer.map(|c| c.country.as_str()),
            Some(self.shop.country.as_str()),
        ]);

        let state = first_non_empty(&[
            Some(requested_state),
            self.billing_state.as_deref(),
            self.card_state.as_deref(),
            customer.map(|c| c.state.as_str()),
            Some(self.shop.state.as_str()),
        ]);

        Location::new(country, state)
    }
}

fn first_non_empty(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .find(|value| !value.is_empty())
        .map(|value| value.to_string())
        .unwrap_or_default()
}
