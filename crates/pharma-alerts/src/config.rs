//! # Alert Settings
//!
//! Thresholds and timing for the alert engine. This is the `[alerts]`
//! section of `pharmacy.toml`; every field has a default so the section may
//! be omitted entirely.
//!
//! ```toml
//! [alerts]
//! low_stock_threshold = 20
//! low_stock_high_threshold = 5
//! near_expiry_days = 30
//! near_expiry_high_days = 7
//! dedup_prefix_chars = 50
//! scan_interval_secs = 300
//! retry_interval_secs = 60
//! notify = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AlertError, AlertResult};
use pharma_core::rules::AlertThresholds;

/// Alert engine and scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Total units at or below which a medicine is low on stock.
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: i64,

    /// Total units at or below which low stock is high priority.
    #[serde(default = "default_low_stock_high")]
    pub low_stock_high_threshold: i64,

    /// Days ahead that count as near expiry.
    #[serde(default = "default_near_expiry_days")]
    pub near_expiry_days: i64,

    /// Days ahead at or below which near expiry is high priority.
    #[serde(default = "default_near_expiry_high_days")]
    pub near_expiry_high_days: i64,

    /// Leading message characters compared when deduplicating.
    #[serde(default = "default_dedup_prefix_chars")]
    pub dedup_prefix_chars: usize,

    /// Normal cadence of the background scan (seconds).
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Shorter recheck after a failed scan (seconds).
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Send a summary to the notifier when a scan inserts alerts.
    #[serde(default = "default_true")]
    pub notify: bool,
}

fn default_low_stock() -> i64 {
    20
}
fn default_low_stock_high() -> i64 {
    5
}
fn default_near_expiry_days() -> i64 {
    30
}
fn default_near_expiry_high_days() -> i64 {
    7
}
fn default_dedup_prefix_chars() -> usize {
    50
}
fn default_scan_interval() -> u64 {
    300
}
fn default_retry_interval() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings {
            low_stock_threshold: default_low_stock(),
            low_stock_high_threshold: default_low_stock_high(),
            near_expiry_days: default_near_expiry_days(),
            near_expiry_high_days: default_near_expiry_high_days(),
            dedup_prefix_chars: default_dedup_prefix_chars(),
            scan_interval_secs: default_scan_interval(),
            retry_interval_secs: default_retry_interval(),
            notify: default_true(),
        }
    }
}

impl AlertSettings {
    /// Validates the settings.
    pub fn validate(&self) -> AlertResult<()> {
        if self.low_stock_threshold < 0 || self.low_stock_high_threshold < 0 {
            return Err(AlertError::InvalidConfig(
                "low stock thresholds must not be negative".into(),
            ));
        }

        if self.low_stock_high_threshold > self.low_stock_threshold {
            return Err(AlertError::InvalidConfig(format!(
                "low_stock_high_threshold ({}) must not exceed low_stock_threshold ({})",
                self.low_stock_high_threshold, self.low_stock_threshold
            )));
        }

        if self.near_expiry_days < 0 || self.near_expiry_high_days < 0 {
            return Err(AlertError::InvalidConfig(
                "near expiry windows must not be negative".into(),
            ));
        }

        if self.near_expiry_high_days > self.near_expiry_days {
            return Err(AlertError::InvalidConfig(format!(
                "near_expiry_high_days ({}) must not exceed near_expiry_days ({})",
                self.near_expiry_high_days, self.near_expiry_days
            )));
        }

        if self.dedup_prefix_chars == 0 {
            return Err(AlertError::InvalidConfig(
                "dedup_prefix_chars must be greater than 0".into(),
            ));
        }

        if self.scan_interval_secs == 0 || self.retry_interval_secs == 0 {
            return Err(AlertError::InvalidConfig(
                "scan and retry intervals must be greater than 0".into(),
            ));
        }

        if self.retry_interval_secs > self.scan_interval_secs {
            return Err(AlertError::InvalidConfig(format!(
                "retry_interval_secs ({}) must not exceed scan_interval_secs ({})",
                self.retry_interval_secs, self.scan_interval_secs
            )));
        }

        Ok(())
    }

    /// The rule thresholds these settings describe.
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            low_stock: self.low_stock_threshold,
            low_stock_high: self.low_stock_high_threshold,
            near_expiry_days: self.near_expiry_days,
            near_expiry_high_days: self.near_expiry_high_days,
            dedup_prefix_chars: self.dedup_prefix_chars,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}
