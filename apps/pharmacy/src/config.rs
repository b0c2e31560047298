//! # Pharmacy Configuration
//!
//! One TOML file for the whole app, every section optional.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMA_DB_PATH=/srv/pharmacy/pharma.db                             │
//! │     PHARMA_SCAN_INTERVAL_SECS=120                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/pharmacy/pharmacy.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/pharmacy/pharma.db"
//! max_connections = 5
//!
//! [sales]
//! tax_rate_bps = 500
//!
//! [alerts]
//! low_stock_threshold = 20
//! near_expiry_days = 30
//! scan_interval_secs = 300
//! retry_interval_secs = 60
//!
//! [reports]
//! unread_badge_limit = 10
//! top_medicines_limit = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use pharma_alerts::AlertSettings;
use pharma_core::validation::validate_tax_rate_bps;
use pharma_core::TaxRate;

// =============================================================================
// Config Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No data directory available for the database")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to `pharma.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// `[sales]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSettings {
    /// Tax applied to every receipt, in basis points.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
}

fn default_tax_rate_bps() -> u32 {
    pharma_core::DEFAULT_TAX_RATE_BPS
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            tax_rate_bps: default_tax_rate_bps(),
        }
    }
}

/// `[reports]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// How many unread alerts the header badge lists.
    #[serde(default = "default_badge_limit")]
    pub unread_badge_limit: u32,

    #[serde(default = "default_top_medicines")]
    pub top_medicines_limit: u32,
}

fn default_badge_limit() -> u32 {
    10
}

fn default_top_medicines() -> u32 {
    10
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            unread_badge_limit: default_badge_limit(),
            top_medicines_limit: default_top_medicines(),
        }
    }
}

// =============================================================================
// Pharmacy Config
// =============================================================================

/// Complete app configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacyConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SalesSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub reports: ReportSettings,
}

impl PharmacyConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pharmacy.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading pharmacy config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        validate_tax_rate_bps(self.sales.tax_rate_bps)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        self.alerts
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.reports.unread_badge_limit == 0 || self.reports.top_medicines_limit == 0 {
            return Err(ConfigError::Invalid(
                "report limits must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides looked up through `var`. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("PHARMA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        override_number(&var, "PHARMA_TAX_RATE_BPS", &mut self.sales.tax_rate_bps);
        override_number(
            &var,
            "PHARMA_SCAN_INTERVAL_SECS",
            &mut self.alerts.scan_interval_secs,
        );
        override_number(
            &var,
            "PHARMA_RETRY_INTERVAL_SECS",
            &mut self.alerts.retry_interval_secs,
        );
        override_number(
            &var,
            "PHARMA_LOW_STOCK_THRESHOLD",
            &mut self.alerts.low_stock_threshold,
        );
        override_number(
            &var,
            "PHARMA_NEAR_EXPIRY_DAYS",
            &mut self.alerts.near_expiry_days,
        );
    }

    /// The database file to open.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        directories::ProjectDirs::from("com", "pharmacy", "inventory")
            .map(|dirs| dirs.data_dir().join("pharma.db"))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sales.tax_rate_bps)
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pharmacy", "inventory")
            .map(|dirs| dirs.config_dir().join("pharmacy.toml"))
    }
}

fn override_number<F, T>(var: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = var(key) else {
        return;
    };

    match raw.trim().parse::<T>() {
        Ok(value) => {
            debug!(key, %value, "Overriding setting from environment");
            *target = value;
        }
        Err(_) => warn!(key, value = %raw, "Ignoring unparseable environment override"),
    }
}
