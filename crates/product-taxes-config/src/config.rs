//! # Product Tax Configuration
//!
//! Loading, validating and saving the product tax settings file.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PRODUCT_TAXES_ENABLED=true                                         │
//! │     PRODUCT_TAXES_FALLBACK_RATE=6.5                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/product-taxes/product-taxes.toml (Linux)                 │
//! │     ~/Library/Application Support/com.product-taxes.product-taxes/...  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     everything off, fallback 0%, no rules                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [checkout]
//! taxes_enabled = true
//! prices_include_tax = false
//!
//! [integrations]
//! services = true
//! shipping = true
//! commissions = false
//!
//! [product_taxes]
//! enable_product_taxes = true
//! enable_fee_taxes = false
//! product_tax_rate = "6.5"
//! product_tax_categories = [12]
//!
//! [[product_taxes.product_tax_rates]]
//! country = "US"
//! state = "CA"
//! rate = "7.25"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use product_taxes_core::validation::{
    sanitize_rate_rows, validate_country_code, validate_fallback_rate, validate_percentage, RateRowInput,
};
use product_taxes_core::{Checkout, Integrations, ProductTaxSettings, TaxError, TaxMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "PRODUCT_TAXES_";

// =============================================================================
// Checkout Settings
// =============================================================================

/// Platform-wide checkout switches, as stored in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// The platform charges tax at all.
    #[serde(default = "default_true")]
    pub taxes_enabled: bool,

    /// Catalogue prices already contain tax.
    #[serde(default)]
    pub prices_include_tax: bool,

    /// Checkout shows prices including tax. Feeds the tax label wording.
    #[serde(default)]
    pub show_tax_inclusive: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            taxes_enabled: true,
            prices_include_tax: false,
            show_tax_inclusive: false,
        }
    }
}

impl CheckoutSettings {
    pub fn checkout(&self) -> Checkout {
        Checkout {
            taxes_enabled: self.taxes_enabled,
            mode: TaxMode::from_prices_include_tax(self.prices_include_tax),
            show_tax_inclusive: self.show_tax_inclusive,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete product tax configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTaxConfig {
    /// Platform checkout switches.
    #[serde(default)]
    pub checkout: CheckoutSettings,

    /// Installed host extensions.
    #[serde(default)]
    pub integrations: Integrations,

    /// Product tax settings proper.
    #[serde(default)]
    pub product_taxes: ProductTaxSettings,
}

impl ProductTaxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides taken from `lookup` instead of
    /// the process environment.
    pub fn load_with<F>(config_path: Option<PathBuf>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_or_default(config_path)?;

        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// The file contents alone, or defaults when there is no file.
    pub fn read_or_default(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading product tax config from file");
                Self::read(&path)
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load product tax config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Reads one file without applying environment overrides.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, rules = self.product_taxes.product_tax_rates.len(), "Product tax config saved");
        Ok(path)
    }

    /// Validates the configuration.
    ///
    /// Rate rules read from a file are typed already but may still carry
    /// out-of-range rates or malformed country codes.
    pub fn validate(&self) -> ConfigResult<()> {
        let settings = &self.product_taxes;

        validate_fallback_rate(settings.product_tax_rate)?;

        for (index, rule) in settings.product_tax_rates.iter().enumerate() {
            let checked = validate_country_code(&rule.country)
                .and_then(|_| rule.rate.map_or(Ok(()), |rate| validate_percentage("rate", rate)));

            if let Err(source) = checked {
                return Err(TaxError::InvalidRateRow {
                    row: index + 1,
                    source,
                }
                .into());
            }
        }

        if settings.enable_fee_taxes && !settings.enable_product_taxes {
            warn!("enable_fee_taxes has no effect while enable_product_taxes is off");
        }

        Ok(())
    }

    /// Applies `PRODUCT_TAXES_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup.
    ///
    /// ## Keys (after the `PRODUCT_TAXES_` prefix)
    /// `ENABLED`, `FEE_TAXES`, `MITIGATE_LIABILITY`, `DISABLE_INTEGRATIONS`,
    /// `FALLBACK_RATE`, `RATES_JSON`, `PRICES_INCLUDE_TAX`, `TAXES_ENABLED`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let settings = &mut self.product_taxes;

        override_bool(var("ENABLED"), "ENABLED", &mut settings.enable_product_taxes);
        override_bool(var("FEE_TAXES"), "FEE_TAXES", &mut settings.enable_fee_taxes);
        override_bool(
            var("MITIGATE_LIABILITY"),
            "MITIGATE_LIABILITY",
            &mut settings.mitigate_tax_liability,
        );
        override_bool(
            var("DISABLE_INTEGRATIONS"),
            "DISABLE_INTEGRATIONS",
            &mut settings.disable_integrations,
        );
        override_bool(var("TAXES_ENABLED"), "TAXES_ENABLED", &mut self.checkout.taxes_enabled);
        override_bool(
            var("PRICES_INCLUDE_TAX"),
            "PRICES_INCLUDE_TAX",
            &mut self.checkout.prices_include_tax,
        );

        if let Some(rate) = var("FALLBACK_RATE") {
            match Decimal::from_str(rate.trim()) {
                Ok(parsed) => {
                    debug!(rate = %parsed, "Overriding fallback rate from environment");
                    settings.product_tax_rate = parsed;
                }
                Err(_) => warn!(rate = %rate, "Ignoring non-numeric fallback rate in environment"),
            }
        }

        if let Some(json) = var("RATES_JSON") {
            let rows = RateRowInput::from_json(&json)?;
            settings.product_tax_rates = sanitize_rate_rows(rows)?;
            debug!(
                rules = settings.product_tax_rates.len(),
                "Overriding rate table from environment"
            );
        }

        Ok(())
    }

    /// Captures the `PRODUCT_TAXES_*` variables currently set.
    pub fn env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "product-taxes", "product-taxes")
            .map(|dirs| dirs.config_dir().join("product-taxes.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn settings(&self) -> &ProductTaxSettings {
        &self.product_taxes
    }

    pub fn is_enabled(&self) -> bool {
        self.product_taxes.enable_product_taxes
    }
}

fn override_bool(value: Option<String>, name: &str, target: &mut bool) {
    let Some(value) = value else {
        return;
    };

    match parse_bool(&value) {
        Some(parsed) => {
            debug!(key = name, value = parsed, "Overriding switch from environment");
            *target = parsed;
        }
        None => warn!(key = name, value = %value, "Unknown boolean in environment"),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use product_taxes_core::RateRule;
    use rust_decimal_macros::dec;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ProductTaxConfig::default();
        assert!(!config.is_enabled());
        assert!(config.checkout.taxes_enabled);
        assert_eq!(config.checkout.checkout().mode, TaxMode::Exclusive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config: ProductTaxConfig = toml::from_str(
            r#"
            [checkout]
            prices_include_tax = true

            [product_taxes]
            enable_product_taxes = true
            product_tax_rate = "6.5"

            [[product_taxes.product_tax_rates]]
            country = "US"
            global = true
            rate = "5"

            [[product_taxes.product_tax_rates]]
            country = "US"
            state = "CA"
            rate = 7.25
            "#,
        )
        .unwrap();

        assert!(config.checkout.taxes_enabled);
        assert!(config.checkout.prices_include_tax);
        assert_eq!(config.product_taxes.product_tax_rate, dec!(6.5));
        assert_eq!(config.product_taxes.product_tax_rates.len(), 2);
        assert_eq!(config.product_taxes.product_tax_rates.rules()[1].rate, Some(dec!(7.25)));
    }

    #[test]
    fn test_validation_rejects_bad_rules() {
        let mut config = ProductTaxConfig::default();
        config.product_taxes.product_tax_rates = vec![RateRule::global("usa", dec!(5))].into();
        assert!(config.validate().is_err());

        config.product_taxes.product_tax_rates = vec![RateRule::global("US", dec!(500))].into();
        assert!(config.validate().is_err());

        config.product_taxes.product_tax_rates = vec![RateRule::global("US", dec!(5))].into();
        config.product_taxes.product_tax_rate = dec!(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ProductTaxConfig::default();
        config
            .apply_overrides(lookup(&[
                ("PRODUCT_TAXES_ENABLED", "yes"),
                ("PRODUCT_TAXES_FALLBACK_RATE", "4.75"),
                ("PRODUCT_TAXES_PRICES_INCLUDE_TAX", "1"),
                ("PRODUCT_TAXES_RATES_JSON", r#"[{"country": "NL", "global": "1", "rate": "21"}]"#),
            ]))
            .unwrap();

        assert!(config.is_enabled());
        assert_eq!(config.product_taxes.product_tax_rate, dec!(4.75));
        assert!(config.checkout.prices_include_tax);
        assert_eq!(config.product_taxes.product_tax_rates.rules()[0].country, "NL");
    }

    #[test]
    fn test_invalid_overrides_are_ignored_or_rejected() {
        let mut config = ProductTaxConfig::default();
        config
            .apply_overrides(lookup(&[
                ("PRODUCT_TAXES_ENABLED", "maybe"),
                ("PRODUCT_TAXES_FALLBACK_RATE", "lots"),
            ]))
            .unwrap();
        assert!(!config.is_enabled());
        assert!(config.product_taxes.product_tax_rate.is_zero());

        let result = config.apply_overrides(lookup(&[(
            "PRODUCT_TAXES_RATES_JSON",
            r#"[{"country": "NL", "rate": "x"}]"#,
        )]));
        assert!(matches!(result, Err(ConfigError::Tax(_))));
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("product-taxes.toml");

        let mut config = ProductTaxConfig::default();
        config.product_taxes.enable_product_taxes = true;
        config.product_taxes.product_tax_rate = dec!(6.5);
        config.product_taxes.product_tax_rates = vec![
            RateRule::state("US", "CA", dec!(7.25)),
            RateRule::state("US", "OR", dec!(1)).without_rate(),
        ]
        .into();

        let saved_to = config.save(Some(path.clone())).unwrap();
        assert_eq!(saved_to, path);

        let loaded = ProductTaxConfig::read(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProductTaxConfig::load_with(Some(dir.path().join("absent.toml")), |_| None).unwrap();
        assert_eq!(config, ProductTaxConfig::default());
    }

    #[test]
    fn test_load_with_layers_overrides_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product-taxes.toml");

        let mut saved = ProductTaxConfig::default();
        saved.product_taxes.product_tax_rate = dec!(6.5);
        saved.save(Some(path.clone())).unwrap();

        let config =
            ProductTaxConfig::load_with(Some(path.clone()), lookup(&[("PRODUCT_TAXES_ENABLED", "1")])).unwrap();
        assert!(config.is_enabled());
        assert_eq!(config.product_taxes.product_tax_rate, dec!(6.5));
        assert!(!ProductTaxConfig::read_or_default(Some(path)).unwrap().is_enabled());
    }

    #[test]
    fn test_checkout_carries_label_display() {
        let settings = CheckoutSettings {
            show_tax_inclusive: true,
            ..Default::default()
        };
        assert!(settings.checkout().show_tax_inclusive);
        assert!(!CheckoutSettings::default().checkout().show_tax_inclusive);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("perhaps"), None);
    }
}
