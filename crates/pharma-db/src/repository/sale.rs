//! # Sale Repository
//!
//! The sale transaction and the append-only sales ledger.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record_sale(request)                              │
//! │                                                                         │
//! │  validate request (customer, 1..100 lines, qty > 0, price ≥ 0, fits)   │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │  for each line:                                                         │
//! │   ├── UPDATE batches SET quantity = quantity - q                       │
//! │   │     WHERE id = ? AND quantity >= q        ← check + decrement      │
//! │   │         │                                                           │
//! │   │         ├── 0 rows → batch missing?  → NotFound          ┐         │
//! │   │         │            else            → InsufficientStock ├ ROLLBACK│
//! │   │         │                                                ┘         │
//! │   │         └── 1 row  → snapshot medicine name + batch_no             │
//! │   └── INSERT INTO sales (... transaction_id ...)                       │
//! │       │                                                                 │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │  Receipt { SA-000123, lines, subtotal, tax (rounded once), total }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional UPDATE is the only place stock goes down. It is one
//! statement, so two concurrent sales of the same batch serialize on the
//! SQLite write lock and the second one sees the first one's decrement.
//! Returning early from inside the transaction drops it, which rolls back.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pharma_core::receipt::{receipt_number, Receipt, ReceiptLine, ReceiptTotals};
use pharma_core::validation::validate_sale_request;
use pharma_core::{CoreError, Sale, SaleRequest, TaxRate};

const SALE_COLUMNS: &str = "id, transaction_id, batch_id, medicine_name, batch_no, quantity_sold, \
                            selling_price_cents, customer_name, customer_phone, customer_age, \
                            prescription_number, doctor_name, diagnosis, payment_method, sold_on";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Applies a multi-line sale atomically and returns its receipt.
    ///
    /// ## Errors
    /// - `Rejected(Validation)` before any stock is touched
    /// - `Rejected(NotFound)` for an unknown batch id
    /// - `Rejected(InsufficientStock)` with the batch's remaining units
    /// - any store failure, after which nothing has changed
    pub async fn record_sale(&self, request: &SaleRequest, tax_rate: TaxRate) -> DbResult<Receipt> {
        validate_sale_request(request)?;

        let transaction_id = Uuid::new_v4().to_string();
        let sold_on = Utc::now();
        let customer = &request.customer;

        debug!(
            transaction_id = %transaction_id,
            lines = request.lines.len(),
            "Recording sale"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut items = Vec::with_capacity(request.lines.len());
        let mut last_sale_id = 0;

        for line in &request.lines {
            let decremented = sqlx::query(
                "UPDATE batches SET quantity = quantity - ?1 WHERE id = ?2 AND quantity >= ?1",
            )
            .bind(line.quantity)
            .bind(line.batch_id)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let current: Option<(String, i64)> =
                    sqlx::query_as("SELECT batch_no, quantity FROM batches WHERE id = ?1")
                        .bind(line.batch_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                let rejection = match current {
                    None => CoreError::not_found("Batch", line.batch_id),
                    Some((batch_no, available)) => CoreError::InsufficientStock {
                        batch_no,
                        available,
                        requested: line.quantity,
                    },
                };

                warn!(
                    transaction_id = %transaction_id,
                    batch_id = line.batch_id,
                    error = %rejection,
                    "Sale rejected, rolling back"
                );
                return Err(rejection.into());
            }

            let (batch_no, medicine_name): (String, String) = sqlx::query_as(
                r#"
                SELECT b.batch_no, m.name
                FROM batches b
                JOIN medicines m ON m.id = b.medicine_id
                WHERE b.id = ?1
                "#,
            )
            .bind(line.batch_id)
            .fetch_one(&mut *tx)
            .await?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO sales (
                    transaction_id, batch_id, medicine_name, batch_no,
                    quantity_sold, selling_price_cents,
                    customer_name, customer_phone, customer_age,
                    prescription_number, doctor_name, diagnosis,
                    payment_method, sold_on
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )
            .bind(&transaction_id)
            .bind(line.batch_id)
            .bind(&medicine_name)
            .bind(&batch_no)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(customer.name.trim())
            .bind(customer.phone.trim())
            .bind(customer.age)
            .bind(&customer.prescription_number)
            .bind(&customer.doctor_name)
            .bind(&customer.diagnosis)
            .bind(customer.payment_method)
            .bind(sold_on)
            .execute(&mut *tx)
            .await?;

            last_sale_id = inserted.last_insert_rowid();
            items.push(ReceiptLine::new(
                medicine_name,
                batch_no,
                line.quantity,
                line.unit_price(),
            )?);
        }

        // Totals are settled before COMMIT so an amount that does not fit rolls back
        let totals = ReceiptTotals::compute(&items, tax_rate)?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let receipt = Receipt {
            receipt_number: receipt_number(last_sale_id),
            transaction_id,
            customer_name: customer.name.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            payment_method: customer.payment_method,
            sold_on,
            items,
            tax_rate_bps: tax_rate.bps(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            grand_total_cents: totals.grand_total.cents(),
        };

        info!(
            receipt = %receipt.receipt_number,
            transaction_id = %receipt.transaction_id,
            lines = receipt.items.len(),
            total = %receipt.grand_total(),
            "Sale recorded"
        );

        Ok(receipt)
    }

    /// Most recent sale lines, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY sold_on DESC, id DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Every line of one receipt, in the order they were sold.
    pub async fn by_transaction(&self, transaction_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE transaction_id = ?1 ORDER BY id",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Counts sale lines.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
