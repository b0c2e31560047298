//! # Domain Types
//!
//! Typed records for everything the pharmacy persists.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1:N ┌─────────────────┐                            │
//! │  │    Medicine     │────►│      Batch      │                            │
//! │  │  ─────────────  │     │  ─────────────  │                            │
//! │  │  id             │     │  id             │                            │
//! │  │  name           │     │  batch_no (uniq)│                            │
//! │  │  category       │     │  quantity ≥ 0   │                            │
//! │  └─────────────────┘     │  expiry_date    │                            │
//! │                          └────────┬────────┘                            │
//! │                     referenced by │ (not owned)                         │
//! │                   ┌───────────────┴───────────────┐                     │
//! │                   ▼                               ▼                     │
//! │  ┌─────────────────────────┐     ┌─────────────────────────┐            │
//! │  │          Sale           │     │          Alert          │            │
//! │  │  append-only ledger     │     │  low_stock/expiry/      │            │
//! │  │  name + batch snapshot  │     │  expired, is_read       │            │
//! │  └─────────────────────────┘     └─────────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale and Alert rows copy the medicine name and batch number at write
//! time. A later rename or deletion never leaves them unreadable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Alert Type & Priority
// =============================================================================

/// What condition an alert reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Total stock of a medicine is at or below the threshold.
    LowStock,
    /// A batch with stock left expires within the near-expiry window.
    Expiry,
    /// A batch with stock left is past its expiry date.
    Expired,
}

impl AlertType {
    /// The value stored in the `alerts.alert_type` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::Expiry => "expiry",
            AlertType::Expired => "expired",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of an alert. Ordered so `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
}

impl AlertPriority {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    Insurance,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Insurance => "insurance",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit_card" | "debit_card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "insurance" => Ok(PaymentMethod::Insurance),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown method '{}', expected cash, card, upi or insurance", other),
            }),
        }
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the catalogue. Stock lives on its batches.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub composition: Option<String>,
    pub uses: Option<String>,
    pub dosage: Option<String>,
    pub side_effects: Option<String>,
    pub category: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or editing a medicine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicineInput {
    pub name: String,
    pub composition: Option<String>,
    pub uses: Option<String>,
    pub dosage: Option<String>,
    pub side_effects: Option<String>,
    pub category: Option<String>,
}

impl MedicineInput {
    /// Convenience constructor for the common name-and-category case.
    pub fn named(name: impl Into<String>, category: impl Into<String>) -> Self {
        MedicineInput {
            name: name.into(),
            category: Some(category.into()),
            ..Default::default()
        }
    }
}

/// A medicine with its stock totals, as listed in the catalogue view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MedicineStock {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub composition: Option<String>,
    pub total_stock: i64,
    pub batch_count: i64,
}

// =============================================================================
// Batch
// =============================================================================

/// A receipt of stock for one medicine, with its own expiry and pricing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: i64,
    pub medicine_id: i64,
    /// Unique across the whole store.
    pub batch_no: String,
    /// Units on hand. Never negative.
    pub quantity: i64,
    /// Maximum retail price per unit, in cents.
    pub mrp_cents: i64,
    pub cost_price_cents: i64,
    #[ts(as = "Option<String>")]
    pub mfg_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Batch {
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_cents(self.mrp_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Days from `today` until expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

/// Fields for receiving a new batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBatch {
    pub medicine_id: i64,
    pub batch_no: String,
    pub quantity: i64,
    pub mrp_cents: i64,
    pub cost_price_cents: i64,
    #[ts(as = "Option<String>")]
    pub mfg_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
    pub supplier: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a completed sale. Sales are an append-only ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    /// Shared by every line of the same receipt.
    pub transaction_id: String,
    pub batch_id: i64,
    /// Medicine name at time of sale (frozen).
    pub medicine_name: String,
    /// Batch number at time of sale (frozen).
    pub batch_no: String,
    pub quantity_sold: i64,
    pub selling_price_cents: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_age: Option<i64>,
    pub prescription_number: Option<String>,
    pub doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sold_on: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.selling_price().multiply_quantity(self.quantity_sold)
    }
}

/// Who is buying. Name and phone are required, the rest is optional
/// prescription bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub age: Option<i64>,
    pub prescription_number: Option<String>,
    pub doctor_name: Option<String>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CustomerInfo {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        CustomerInfo {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        }
    }
}

/// One requested line of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub batch_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SaleLineRequest {
    pub fn new(batch_id: i64, quantity: i64, unit_price: Money) -> Self {
        SaleLineRequest {
            batch_id,
            quantity,
            unit_price_cents: unit_price.cents(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// A complete sale request: customer plus ordered, non-empty lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    pub customer: CustomerInfo,
    pub lines: Vec<SaleLineRequest>,
}

// =============================================================================
// Alert
// =============================================================================

/// An operational alert raised by the alert rule engine.
///
/// Only `is_read` ever changes after insert; alerts are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Alert {
    pub id: i64,
    pub alert_type: AlertType,
    pub message: String,
    pub medicine_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub medicine_name: Option<String>,
    pub batch_no: Option<String>,
    pub priority: AlertPriority,
    pub is_read: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An alert the rules want to raise, before dedup and insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub alert_type: AlertType,
    pub message: String,
    pub medicine_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub medicine_name: Option<String>,
    pub batch_no: Option<String>,
    pub priority: AlertPriority,
}

// =============================================================================
// Interaction
// =============================================================================

/// A known interaction between two drugs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Interaction {
    pub id: i64,
    pub drug_a: String,
    pub drug_b: String,
    pub interaction: String,
    pub severity: String,
    pub recommendation: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_expiring(expiry: NaiveDate) -> Batch {
        Batch {
            id: 1,
            medicine_id: 1,
            batch_no: "PCM-2401".to_string(),
            quantity: 10,
            mrp_cents: 1000,
            cost_price_cents: 700,
            mfg_date: None,
            expiry_date: expiry,
            supplier: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tax_rate_default_is_five_percent() {
        let rate = TaxRate::default();
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_batch_expiry_helpers() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let batch = batch_expiring(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(batch.days_until_expiry(today), 30);
        assert!(!batch.is_expired(today));

        let old = batch_expiring(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(old.days_until_expiry(today), -1);
        assert!(old.is_expired(today));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("debit_card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_alert_enums_serialize_as_column_values() {
        assert_eq!(serde_json::to_string(&AlertType::LowStock).unwrap(), "\"low_stock\"");
        assert_eq!(serde_json::to_string(&AlertPriority::High).unwrap(), "\"high\"");
        assert!(AlertPriority::High > AlertPriority::Medium);
        assert!(AlertPriority::Medium > AlertPriority::Low);
    }

    #[test]
    fn test_sale_line_total() {
        let line = SaleLineRequest::new(3, 2, Money::from_cents(1000));
        assert_eq!(line.unit_price().multiply_quantity(line.quantity).cents(), 2000);
    }
}
