//! # Alert Notifications
//!
//! After a scan inserts new alerts, the engine hands an [`AlertSummary`] to
//! an [`AlertNotifier`]. Rendering and delivery (email, push, a desk
//! display) belong to the notifier; this crate only builds the summary.
//!
//! ```text
//! AlertEngine::scan_at ──► inserted ids ──► AlertSummary::from_alerts
//!                                                   │
//!                                                   ▼
//!                                      AlertNotifier::notify(&summary)
//!                                                   │
//!                                       Err ──► warn!, scan still Ok
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::AlertResult;
use pharma_core::{Alert, AlertPriority, AlertType};

// =============================================================================
// Summary
// =============================================================================

/// Alert counts per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AlertTypeCounts {
    pub low_stock: usize,
    pub expiry: usize,
    pub expired: usize,
}

/// Counts by priority and type, plus one display line per alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AlertSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub by_type: AlertTypeCounts,
    /// `"[HIGH] Batch AMX-24C01 of Amoxicillin expires in 5 days"`, high first.
    pub lines: Vec<String>,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut summary = AlertSummary {
            total: alerts.len(),
            ..AlertSummary::default()
        };

        for alert in alerts {
            match alert.priority {
                AlertPriority::High => summary.high += 1,
                AlertPriority::Medium => summary.medium += 1,
                AlertPriority::Low => summary.low += 1,
            }
            match alert.alert_type {
                AlertType::LowStock => summary.by_type.low_stock += 1,
                AlertType::Expiry => summary.by_type.expiry += 1,
                AlertType::Expired => summary.by_type.expired += 1,
            }
        }

        let mut ordered: Vec<&Alert> = alerts.iter().collect();
        // Stable sort keeps the caller's order within a priority
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        summary.lines = ordered
            .into_iter()
            .map(|a| format!("[{}] {}", a.priority.as_str().to_uppercase(), a.message))
            .collect();

        summary
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// One-line headline, e.g. `"3 new alerts (2 high, 1 medium, 0 low)"`.
    pub fn headline(&self) -> String {
        format!(
            "{} new alert{} ({} high, {} medium, {} low)",
            self.total,
            if self.total == 1 { "" } else { "s" },
            self.high,
            self.medium,
            self.low
        )
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Receives a summary whenever a scan inserted at least one alert.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, summary: &AlertSummary) -> AlertResult<()>;
}

/// Writes summaries to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, summary: &AlertSummary) -> AlertResult<()> {
        if summary.high > 0 {
            warn!(
                total = summary.total,
                high = summary.high,
                "{}",
                summary.headline()
            );
        } else {
            info!(total = summary.total, "{}", summary.headline());
        }

        for line in &summary.lines {
            info!("  {}", line);
        }

        Ok(())
    }
}
