//! # Receipt
//!
//! The receipt returned for a committed sale transaction.
//!
//! ```text
//! SA-000042                          2026-03-01 10:42
//! Asha Rao (+91 98450 12345)                     cash
//! ─────────────────────────────────────────────────────
//! Paracetamol 500mg   PCM-2401   2 × 10.00     20.00
//! Cetirizine 10mg     CTZ-0912   1 ×  5.00      5.00
//! ─────────────────────────────────────────────────────
//!                                 Subtotal     25.00
//!                                 Tax (5%)      1.25
//!                                 Total        26.25
//! ```
//!
//! Line totals are exact. Tax is rounded once, on the subtotal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};

fn too_large(field: &str) -> ValidationError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
}

/// Receipt numbers are the last sale row id, zero-padded: `SA-000042`.
pub fn receipt_number(last_sale_id: i64) -> String {
    format!("SA-{:06}", last_sale_id)
}

// =============================================================================
// Receipt Lines & Totals
// =============================================================================

/// One printed line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub medicine_name: String,
    pub batch_no: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl ReceiptLine {
    /// Fails with `TooLarge` when `quantity × unit_price` overflows.
    pub fn new(
        medicine_name: impl Into<String>,
        batch_no: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, ValidationError> {
        let line_total = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| too_large("line_total"))?;

        Ok(ReceiptLine {
            medicine_name: medicine_name.into(),
            batch_no: batch_no.into(),
            quantity,
            unit_price_cents: unit_price.cents(),
            line_total_cents: line_total.cents(),
        })
    }
}

/// Subtotal, tax and grand total of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl ReceiptTotals {
    /// Sums line totals, then applies the tax rate once.
    ///
    /// Every step is checked; an amount that does not fit is `TooLarge`.
    pub fn compute(lines: &[ReceiptLine], rate: TaxRate) -> Result<Self, ValidationError> {
        let subtotal = lines.iter().try_fold(Money::zero(), |acc, l| {
            acc.checked_add(Money::from_cents(l.line_total_cents))
                .ok_or_else(|| too_large("subtotal"))
        })?;
        let tax = subtotal.checked_tax(rate).ok_or_else(|| too_large("tax"))?;
        let grand_total = subtotal
            .checked_add(tax)
            .ok_or_else(|| too_large("grand_total"))?;

        Ok(ReceiptTotals {
            subtotal,
            tax,
            grand_total,
        })
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Everything the counter prints after a successful sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub receipt_number: String,
    pub transaction_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sold_on: DateTime<Utc>,
    pub items: Vec<ReceiptLine>,
    pub tax_rate_bps: u32,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
}

impl Receipt {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_padding() {
        assert_eq!(receipt_number(42), "SA-000042");
        assert_eq!(receipt_number(123), "SA-000123");
        assert_eq!(receipt_number(1_234_567), "SA-1234567");
    }

    #[test]
    fn test_totals_two_lines() {
        let lines = vec![
            ReceiptLine::new("Paracetamol 500mg", "PCM-2401", 2, Money::from_cents(1000)).unwrap(),
            ReceiptLine::new("Cetirizine 10mg", "CTZ-0912", 1, Money::from_cents(500)).unwrap(),
        ];
        let totals = ReceiptTotals::compute(&lines, TaxRate::default()).unwrap();

        assert_eq!(lines[0].line_total_cents, 2000);
        assert_eq!(totals.subtotal.cents(), 2500);
        assert_eq!(totals.tax.cents(), 125);
        assert_eq!(totals.grand_total.cents(), 2625);
    }

    #[test]
    fn test_tax_rounded_once_on_subtotal() {
        // Each line alone would round 0.005 up; together the subtotal is taxed once
        let lines = vec![
            ReceiptLine::new("A", "A-1", 1, Money::from_cents(10)).unwrap(),
            ReceiptLine::new("B", "B-1", 1, Money::from_cents(10)).unwrap(),
            ReceiptLine::new("C", "C-1", 1, Money::from_cents(10)).unwrap(),
        ];
        let totals = ReceiptTotals::compute(&lines, TaxRate::from_bps(500)).unwrap();
        assert_eq!(totals.subtotal.cents(), 30);
        assert_eq!(totals.tax.cents(), 2);
    }

    #[test]
    fn test_amounts_that_do_not_fit() {
        let err = ReceiptLine::new("A", "A-1", 10, Money::from_cents(i64::MAX / 5)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field } if field == "line_total"));

        let half = Money::from_cents(i64::MAX / 2 + 1);
        let lines = vec![
            ReceiptLine::new("A", "A-1", 1, half).unwrap(),
            ReceiptLine::new("B", "B-1", 1, half).unwrap(),
        ];
        let err = ReceiptTotals::compute(&lines, TaxRate::from_bps(0)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field } if field == "subtotal"));

        // Subtotal fits, but adding 5% tax does not
        let lines = vec![ReceiptLine::new("A", "A-1", 1, Money::from_cents(i64::MAX - 10)).unwrap()];
        let err = ReceiptTotals::compute(&lines, TaxRate::from_bps(500)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field } if field == "grand_total"));
    }
}
