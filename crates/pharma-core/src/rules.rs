//! # Alert Rules
//!
//! Pure evaluation of the three inventory alert rules.
//!
//! ## Rules
//! ```text
//! ┌──────────────┬──────────────────────────────────────┬──────────────────┐
//! │ Rule         │ Condition                            │ Priority         │
//! ├──────────────┼──────────────────────────────────────┼──────────────────┤
//! │ Low stock    │ 0 < Σ batch.quantity ≤ 20            │ high if ≤ 5      │
//! │ Near expiry  │ qty > 0, today ≤ expiry ≤ today+30   │ high if ≤ 7 days │
//! │ Expired      │ qty > 0, expiry < today              │ high             │
//! └──────────────┴──────────────────────────────────────┴──────────────────┘
//! ```
//!
//! The functions here only decide *what* should be raised. Whether a
//! candidate is actually inserted depends on dedup against unread alerts,
//! which the store decides (see `pharma-alerts`).
//!
//! `today` is always a parameter so the boundaries can be tested exactly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{AlertCandidate, AlertPriority, AlertType};

// =============================================================================
// Thresholds
// =============================================================================

/// Tunable rule thresholds. Defaults match the pharmacy's operating policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Total units at or below which a medicine is low on stock.
    pub low_stock: i64,
    /// Total units at or below which low stock becomes high priority.
    pub low_stock_high: i64,
    /// Days ahead that count as near expiry.
    pub near_expiry_days: i64,
    /// Days ahead at or below which near expiry becomes high priority.
    pub near_expiry_high_days: i64,
    /// Leading characters of the message compared for dedup.
    pub dedup_prefix_chars: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            low_stock: 20,
            low_stock_high: 5,
            near_expiry_days: 30,
            near_expiry_high_days: 7,
            dedup_prefix_chars: 50,
        }
    }
}

// =============================================================================
// Rule Inputs
// =============================================================================

/// Summed stock of one medicine across all of its batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub total_quantity: i64,
}

/// A batch joined with its medicine name, as the expiry rules see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BatchExpiry {
    pub batch_id: i64,
    pub batch_no: String,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
}

// =============================================================================
// Message Templates
// =============================================================================

pub fn low_stock_message(medicine: &str, units: i64) -> String {
    format!("{} is running low ({} units left)", medicine, units)
}

pub fn near_expiry_message(batch_no: &str, medicine: &str, days: i64) -> String {
    format!("Batch {} of {} expires in {} days", batch_no, medicine, days)
}

pub fn expired_message(batch_no: &str, medicine: &str) -> String {
    format!("Batch {} of {} has expired", batch_no, medicine)
}

/// The leading `chars` characters of a message, cut on a char boundary.
///
/// Two unread alerts of the same type with equal prefixes are duplicates.
pub fn dedup_prefix(message: &str, chars: usize) -> &str {
    match message.char_indices().nth(chars) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

// =============================================================================
// Rule Evaluation
// =============================================================================

/// Low-stock rule for one medicine.
pub fn evaluate_low_stock(level: &StockLevel, thresholds: &AlertThresholds) -> Option<AlertCandidate> {
    let total = level.total_quantity;
    if total <= 0 || total > thresholds.low_stock {
        return None;
    }

    let priority = if total <= thresholds.low_stock_high {
        AlertPriority::High
    } else {
        AlertPriority::Medium
    };

    Some(AlertCandidate {
        alert_type: AlertType::LowStock,
        message: low_stock_message(&level.medicine_name, total),
        medicine_id: Some(level.medicine_id),
        batch_id: None,
        medicine_name: Some(level.medicine_name.clone()),
        batch_no: None,
        priority,
    })
}

/// Near-expiry or expired rule for one batch. At most one of the two fires.
pub fn evaluate_expiry(
    batch: &BatchExpiry,
    today: NaiveDate,
    thresholds: &AlertThresholds,
) -> Option<AlertCandidate> {
    if batch.quantity <= 0 {
        return None;
    }

    let days = (batch.expiry_date - today).num_days();

    let (alert_type, message, priority) = if days < 0 {
        (
            AlertType::Expired,
            expired_message(&batch.batch_no, &batch.medicine_name),
            AlertPriority::High,
        )
    } else if days <= thresholds.near_expiry_days {
        let priority = if days <= thresholds.near_expiry_high_days {
            AlertPriority::High
        } else {
            AlertPriority::Medium
        };
        (
            AlertType::Expiry,
            near_expiry_message(&batch.batch_no, &batch.medicine_name, days),
            priority,
        )
    } else {
        return None;
    };

    Some(AlertCandidate {
        alert_type,
        message,
        medicine_id: Some(batch.medicine_id),
        batch_id: Some(batch.batch_id),
        medicine_name: Some(batch.medicine_name.clone()),
        batch_no: Some(batch.batch_no.clone()),
        priority,
    })
}

/// Evaluates every rule over a snapshot of the inventory.
///
/// Candidates come out grouped low stock, near expiry, expired. The order
/// only affects report grouping.
pub fn evaluate(
    levels: &[StockLevel],
    batches: &[BatchExpiry],
    today: NaiveDate,
    thresholds: &AlertThresholds,
) -> Vec<AlertCandidate> {
    let mut candidates: Vec<AlertCandidate> = levels
        .iter()
        .filter_map(|level| evaluate_low_stock(level, thresholds))
        .collect();

    let (expired, near): (Vec<_>, Vec<_>) = batches
        .iter()
        .filter_map(|batch| evaluate_expiry(batch, today, thresholds))
        .partition(|c| c.alert_type == AlertType::Expired);

    candidates.extend(near);
    candidates.extend(expired);
    candidates
}

// =============================================================================
// Unit Tests
// =============================================================================
