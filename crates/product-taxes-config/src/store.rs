//! # Settings Store
//!
//! Holds the live configuration and hands out immutable snapshots.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Snapshot Model                                      │
//! │                                                                         │
//! │  checkout request ──► snapshot() ──► Arc<SettingsSnapshot> ──► resolve  │
//! │                           │                                             │
//! │                      RwLock<Arc<..>>   (read: clone the Arc, release)   │
//! │                           │                                             │
//! │  admin save ───► writer Mutex ──► validate ──► persist ──► swap Arc     │
//! │                                                                         │
//! │  A request keeps the Arc it took, so a concurrent save can never mix    │
//! │  old and new rate rows inside one resolution.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Layers
//! The saved file only ever holds admin values. `PRODUCT_TAXES_*` overrides
//! captured at [`SettingsStore::open`] are re-applied on top of every new
//! revision but never written back.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use product_taxes_core::validation::{sanitize_rate_rows, RateRowInput};
use product_taxes_core::{Location, ProductTaxSettings, ProductTaxes, RateResolver};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::ProductTaxConfig;
use crate::error::ConfigResult;

// =============================================================================
// Snapshot
// =============================================================================

/// One immutable revision of the configuration, overrides applied.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    /// Increments on every successful save.
    pub revision: u64,

    /// When this revision was installed.
    pub installed_at: DateTime<Utc>,

    pub config: ProductTaxConfig,
}

impl SettingsSnapshot {
    pub fn settings(&self) -> &ProductTaxSettings {
        &self.config.product_taxes
    }

    /// A resolver over this snapshot's table and fallback rate.
    pub fn resolver(&self) -> RateResolver<'_> {
        let settings = self.settings();
        RateResolver::new(&settings.product_tax_rates, settings.product_tax_rate)
    }

    /// Checkout hooks bound to this snapshot.
    pub fn product_taxes(&self) -> ProductTaxes<'_> {
        ProductTaxes::new(
            &self.config.product_taxes,
            self.config.integrations,
            self.config.checkout.checkout(),
        )
    }

    /// Shortcut for `resolver().resolve(location)`.
    pub fn rate(&self, location: &Location) -> Decimal {
        self.resolver().resolve(location)
    }
}

// =============================================================================
// Store
// =============================================================================

/// Live configuration with optional file persistence.
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<Arc<SettingsSnapshot>>,

    /// Admin values as saved. Holding the lock serialises writers.
    stored: Mutex<ProductTaxConfig>,

    overrides: HashMap<String, String>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// An in-memory store without overrides; saves are not persisted.
    pub fn new(config: ProductTaxConfig) -> Self {
        SettingsStore {
            current: RwLock::new(Arc::new(SettingsSnapshot {
                revision: 0,
                installed_at: Utc::now(),
                config: config.clone(),
            })),
            stored: Mutex::new(config),
            overrides: HashMap::new(),
            path: None,
        }
    }

    /// Loads `path` (or the default location) with the current
    /// `PRODUCT_TAXES_*` variables as overrides, and persists saves there.
    pub fn open(path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::open_with(path, ProductTaxConfig::env_overrides())
    }

    /// [`open`](Self::open) with an explicit override map.
    pub fn open_with(path: Option<PathBuf>, overrides: HashMap<String, String>) -> ConfigResult<Self> {
        let path = path.or_else(ProductTaxConfig::default_config_path);
        let stored = ProductTaxConfig::read_or_default(path.clone())?;
        stored.validate()?;

        let effective = layer(&stored, &overrides)?;
        if !overrides.is_empty() {
            debug!(keys = overrides.len(), "Environment overrides active for this store");
        }

        Ok(SettingsStore {
            current: RwLock::new(Arc::new(SettingsSnapshot {
                revision: 0,
                installed_at: Utc::now(),
                config: effective,
            })),
            stored: Mutex::new(stored),
            overrides,
            path,
        })
    }

    /// The current revision. Cheap; clone of an `Arc`.
    pub fn snapshot(&self) -> Arc<SettingsSnapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// The admin values as last saved, without overrides.
    pub fn stored(&self) -> ProductTaxConfig {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the whole rate table with validated `rows`.
    ///
    /// Rows are never merged with the previous table. On a validation
    /// error the store is left untouched.
    pub fn replace_rates(&self, rows: Vec<RateRowInput>) -> ConfigResult<Arc<SettingsSnapshot>> {
        let table = sanitize_rate_rows(rows)?;
        self.update(move |settings| settings.product_tax_rates = table)
    }

    /// Applies `change` to a copy of the stored settings, validates,
    /// persists and installs it (overrides layered on) as the next revision.
    pub fn update<F>(&self, change: F) -> ConfigResult<Arc<SettingsSnapshot>>
    where
        F: FnOnce(&mut ProductTaxSettings),
    {
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.snapshot();

        let mut config = stored.clone();
        change(&mut config.product_taxes);
        config.validate()?;
        let effective = layer(&config, &self.overrides)?;

        if let Some(path) = &self.path {
            config.save(Some(path.clone()))?;
        }
        *stored = config;

        let next = Arc::new(SettingsSnapshot {
            revision: previous.revision + 1,
            installed_at: Utc::now(),
            config: effective,
        });

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        info!(
            revision = next.revision,
            rules = stored.product_taxes.product_tax_rates.len(),
            "Product tax settings updated"
        );
        Ok(next)
    }
}

fn layer(stored: &ProductTaxConfig, overrides: &HashMap<String, String>) -> ConfigResult<ProductTaxConfig> {
    let mut effective = stored.clone();
    effective.apply_overrides(|key| overrides.get(key).cloned())?;
    effective.validate()?;
    Ok(effective)
}
