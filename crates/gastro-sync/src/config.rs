//! # Terminal Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GASTRO_TENANT_ID=t_bar_paco                                        │
//! │     GASTRO_DB_PATH=/var/lib/gastrosmart/bar.db                         │
//! │     GASTRO_STOCK_POLICY=warn                                           │
//! │     GASTRO_ALERT_DAYS=7                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/terminal.toml (Linux)                                │
//! │     ~/Library/Application Support/es.gastrosmart.pos/terminal.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     local-only, 10% VAT, ignore missing references                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [tenant]
//! id = "t_bar_paco"
//! name = "Bar Paco"
//! default_vat_bps = 1000
//! irpf_bps = 2000
//!
//! [store]
//! database_path = "/var/lib/gastrosmart/bar.db"
//!
//! [outbox]
//! capacity = 64
//!
//! [stock]
//! missing_reference_policy = "warn"   # ignore | warn | reject
//!
//! [forecast]
//! alert_days = 10
//! sales_window = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use gastro_core::forecast::DEFAULT_ALERT_DAYS;
use gastro_core::{MissingReferencePolicy, TaxRate, Tenant, DEFAULT_TENANT_ID};

use crate::error::{SyncError, SyncResult};

/// Highest rate accepted for any tax setting (100 %).
const MAX_RATE_BPS: u32 = 10_000;

// =============================================================================
// Sections
// =============================================================================

/// The business this terminal belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSection {
    #[serde(default = "default_tenant_id")]
    pub id: String,

    #[serde(default = "default_tenant_name")]
    pub name: String,

    #[serde(default)]
    pub nif: Option<String>,

    /// VAT applied to ticket income. Default: 1000 (10 %)
    #[serde(default = "default_vat_bps")]
    pub default_vat_bps: u32,

    /// Modelo 130 instalment rate. Default: 2000 (20 %)
    #[serde(default = "default_irpf_bps")]
    pub irpf_bps: u32,
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_string()
}

fn default_tenant_name() -> String {
    "GastroSmart".to_string()
}

fn default_vat_bps() -> u32 {
    TaxRate::REDUCED.bps()
}

fn default_irpf_bps() -> u32 {
    TaxRate::IRPF_INSTALMENT.bps()
}

impl Default for TenantSection {
    fn default() -> Self {
        TenantSection {
            id: default_tenant_id(),
            name: default_tenant_name(),
            nif: None,
            default_vat_bps: default_vat_bps(),
            irpf_bps: default_irpf_bps(),
        }
    }
}

/// Where records are persisted. No path means local-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxSection {
    /// Batches that may wait for delivery before new ones are dropped.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    64
}

impl Default for OutboxSection {
    fn default() -> Self {
        OutboxSection {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSection {
    #[serde(default)]
    pub missing_reference_policy: MissingReferencePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSection {
    #[serde(default = "default_alert_days")]
    pub alert_days: i64,

    /// How many of the newest sales the oracle sees.
    #[serde(default = "default_sales_window")]
    pub sales_window: usize,
}

fn default_alert_days() -> i64 {
    DEFAULT_ALERT_DAYS
}

fn default_sales_window() -> usize {
    50
}

impl Default for ForecastSection {
    fn default() -> Self {
        ForecastSection {
            alert_days: default_alert_days(),
            sales_window: default_sales_window(),
        }
    }
}

// =============================================================================
// Terminal Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub tenant: TenantSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub outbox: OutboxSection,

    #[serde(default)]
    pub stock: StockSection,

    #[serde(default)]
    pub forecast: ForecastSection,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.tenant.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("tenant.id must not be empty".into()));
        }

        for (field, bps) in [
            ("tenant.default_vat_bps", self.tenant.default_vat_bps),
            ("tenant.irpf_bps", self.tenant.irpf_bps),
        ] {
            if bps > MAX_RATE_BPS {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    field, MAX_RATE_BPS, bps
                )));
            }
        }

        if self.outbox.capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "outbox.capacity must be greater than 0".into(),
            ));
        }

        if self.forecast.alert_days < 0 {
            return Err(SyncError::InvalidConfig(
                "forecast.alert_days must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies `GASTRO_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("GASTRO_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant id from environment");
            self.tenant.id = id;
        }

        if let Some(path) = lookup("GASTRO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        if let Some(policy) = lookup("GASTRO_STOCK_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.stock.missing_reference_policy = parsed,
                Err(e) => warn!(policy = %policy, "Ignoring GASTRO_STOCK_POLICY: {}", e),
            }
        }

        if let Some(days) = lookup("GASTRO_ALERT_DAYS") {
            match days.parse::<i64>() {
                Ok(d) => self.forecast.alert_days = d,
                Err(_) => warn!(days = %days, "Ignoring non-numeric GASTRO_ALERT_DAYS"),
            }
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("es", "gastrosmart", "pos")
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tenant(&self) -> Tenant {
        Tenant {
            id: self.tenant.id.clone(),
            name: self.tenant.name.clone(),
            nif: self.tenant.nif.clone(),
            default_vat_rate: TaxRate::from_bps(self.tenant.default_vat_bps),
            irpf_rate: TaxRate::from_bps(self.tenant.irpf_bps),
        }
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.store.database_path.as_deref()
    }

    /// False means the terminal runs local-only.
    pub fn is_store_configured(&self) -> bool {
        self.store.database_path.is_some()
    }

    pub fn stock_policy(&self) -> MissingReferencePolicy {
        self.stock.missing_reference_policy
    }
}
