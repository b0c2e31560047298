//! # Batch Repository
//!
//! Stock receipt and the read models the alert rules evaluate.
//!
//! ## Who Touches Batches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  receive()          INSERT            (admin, stock delivery)          │
//! │  SaleRepository     UPDATE quantity   (inside the sale transaction)    │
//! │  stock_levels()     SELECT SUM(...)   (low-stock rule input)           │
//! │  expiry_rows()      SELECT ...        (near-expiry / expired input)    │
//! │                                                                         │
//! │  Quantity is only ever decremented by the sale transaction, with the   │
//! │  stock check inside the same UPDATE.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pharma_core::rules::{BatchExpiry, StockLevel};
use pharma_core::validation::validate_new_batch;
use pharma_core::{Batch, CoreError, NewBatch};

const BATCH_COLUMNS: &str = "id, medicine_id, batch_no, quantity, mrp_cents, cost_price_cents, \
                             mfg_date, expiry_date, supplier, created_at";

/// Repository for batch database operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Receives a new batch into stock.
    ///
    /// ## Errors
    /// - `Validation` for a malformed batch
    /// - `NotFound` when the medicine does not exist
    /// - `DuplicateBatchNumber` when the batch number is taken
    pub async fn receive(&self, batch: &NewBatch) -> DbResult<Batch> {
        validate_new_batch(batch)?;

        let batch_no = batch.batch_no.trim();

        let medicine: Option<i64> = sqlx::query_scalar("SELECT id FROM medicines WHERE id = ?1")
            .bind(batch.medicine_id)
            .fetch_optional(&self.pool)
            .await?;
        if medicine.is_none() {
            return Err(CoreError::not_found("Medicine", batch.medicine_id).into());
        }

        if self.get_by_batch_no(batch_no).await?.is_some() {
            return Err(CoreError::DuplicateBatchNumber(batch_no.to_string()).into());
        }

        debug!(batch_no = %batch_no, medicine_id = batch.medicine_id, "Receiving batch");

        let result = sqlx::query(
            r#"
            INSERT INTO batches (
                medicine_id, batch_no, quantity, mrp_cents, cost_price_cents,
                mfg_date, expiry_date, supplier, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(batch.medicine_id)
        .bind(batch_no)
        .bind(batch.quantity)
        .bind(batch.mrp_cents)
        .bind(batch.cost_price_cents)
        .bind(batch.mfg_date)
        .bind(batch.expiry_date)
        .bind(&batch.supplier)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            // Lost a race with a concurrent receipt of the same number
            DbError::UniqueViolation { .. } => {
                DbError::Rejected(CoreError::DuplicateBatchNumber(batch_no.to_string()))
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();
        info!(id, batch_no = %batch_no, quantity = batch.quantity, "Batch received");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", id))
    }

    /// Gets a batch by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Batch>> {
        let sql = format!("SELECT {} FROM batches WHERE id = ?1", BATCH_COLUMNS);
        let batch = sqlx::query_as::<_, Batch>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(batch)
    }

    /// Gets a batch by its (unique) batch number.
    pub async fn get_by_batch_no(&self, batch_no: &str) -> DbResult<Option<Batch>> {
        let sql = format!("SELECT {} FROM batches WHERE batch_no = ?1", BATCH_COLUMNS);
        let batch = sqlx::query_as::<_, Batch>(&sql)
            .bind(batch_no.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(batch)
    }

    /// All batches of a medicine, soonest expiry first.
    pub async fn list_for_medicine(&self, medicine_id: i64) -> DbResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {} FROM batches WHERE medicine_id = ?1 ORDER BY expiry_date, id",
            BATCH_COLUMNS
        );
        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(medicine_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(batches)
    }

    /// Batches that can be sold today: stock left and expiry after `today`,
    /// in first-expiry-first-out order.
    pub async fn sellable(&self, medicine_id: i64, today: NaiveDate) -> DbResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {} FROM batches \
             WHERE medicine_id = ?1 AND quantity > 0 AND expiry_date > ?2 \
             ORDER BY expiry_date, id",
            BATCH_COLUMNS
        );
        let batches = sqlx::query_as::<_, Batch>(&sql)
            .bind(medicine_id)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(batches)
    }

    /// Total units of a medicine across every batch.
    pub async fn total_stock(&self, medicine_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM batches WHERE medicine_id = ?1",
        )
        .bind(medicine_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    // =========================================================================
    // Rule Inputs
    // =========================================================================

    /// Per-medicine stock totals for the low-stock rule.
    ///
    /// Every batch counts, expired ones included.
    pub async fn stock_levels(&self) -> DbResult<Vec<StockLevel>> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT
                m.id AS medicine_id,
                m.name AS medicine_name,
                COALESCE(SUM(b.quantity), 0) AS total_quantity
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            GROUP BY m.id
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// Batches with stock that expire on or before `horizon`.
    ///
    /// Covers both expiry rules: pass `today + near_expiry_days`.
    pub async fn expiry_rows(&self, horizon: NaiveDate) -> DbResult<Vec<BatchExpiry>> {
        let rows = sqlx::query_as::<_, BatchExpiry>(
            r#"
            SELECT
                b.id AS batch_id,
                b.batch_no,
                b.medicine_id,
                m.name AS medicine_name,
                b.quantity,
                b.expiry_date
            FROM batches b
            JOIN medicines m ON m.id = b.medicine_id
            WHERE b.quantity > 0 AND b.expiry_date <= ?1
            ORDER BY b.expiry_date, b.id
            "#,
        )
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The expiry rule input for a single batch.
    pub async fn expiry_row(&self, batch_id: i64) -> DbResult<Option<BatchExpiry>> {
        let row = sqlx::query_as::<_, BatchExpiry>(
            r#"
            SELECT
                b.id AS batch_id,
                b.batch_no,
                b.medicine_id,
                m.name AS medicine_name,
                b.quantity,
                b.expiry_date
            FROM batches b
            JOIN medicines m ON m.id = b.medicine_id
            WHERE b.id = ?1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Counts batches.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
