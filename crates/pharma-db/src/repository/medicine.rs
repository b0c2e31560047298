//! # Medicine Repository
//!
//! Catalogue operations for medicines.
//!
//! ## Deletion Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete(medicine)                                                      │
//! │       │                                                                 │
//! │       ├── any sale references one of its batches?                      │
//! │       │        └── yes → MedicineHasSales (nothing deleted)            │
//! │       │                                                                 │
//! │       └── no  → DELETE medicine                                        │
//! │                 ├── batches    ON DELETE CASCADE                       │
//! │                 └── alerts     ON DELETE SET NULL (snapshot kept)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The ledger never ends up pointing at nothing.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use pharma_core::validation::{validate_medicine_input, validate_search_query};
use pharma_core::{CoreError, Medicine, MedicineInput, MedicineStock};

const MEDICINE_COLUMNS: &str = "id, name, composition, uses, dosage, side_effects, category, \
                                created_at, updated_at";

/// Repository for medicine database operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Adds a medicine to the catalogue.
    pub async fn create(&self, input: &MedicineInput) -> DbResult<Medicine> {
        validate_medicine_input(input)?;

        let now = Utc::now();
        let name = input.name.trim();

        debug!(name = %name, "Creating medicine");

        let result = sqlx::query(
            r#"
            INSERT INTO medicines (
                name, composition, uses, dosage, side_effects, category,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(name)
        .bind(&input.composition)
        .bind(&input.uses)
        .bind(&input.dosage)
        .bind(&input.side_effects)
        .bind(&input.category)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, name = %name, "Medicine created");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Edits a medicine. `updated_at` is bumped.
    pub async fn update(&self, id: i64, input: &MedicineInput) -> DbResult<Medicine> {
        validate_medicine_input(input)?;

        debug!(id, "Updating medicine");

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                name = ?2,
                composition = ?3,
                uses = ?4,
                dosage = ?5,
                side_effects = ?6,
                category = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.composition)
        .bind(&input.uses)
        .bind(&input.dosage)
        .bind(&input.side_effects)
        .bind(&input.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Medicine", id).into());
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Gets a medicine by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Medicine>> {
        let sql = format!("SELECT {} FROM medicines WHERE id = ?1", MEDICINE_COLUMNS);
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Gets a medicine by ID, failing with NotFound.
    pub async fn require(&self, id: i64) -> DbResult<Medicine> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Medicine", id).into())
    }

    /// First medicine whose name contains `fragment` (case-insensitive).
    ///
    /// Used to cross-reference classifier labels against the catalogue.
    pub async fn find_by_name_fragment(&self, fragment: &str) -> DbResult<Option<Medicine>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM medicines WHERE name LIKE '%' || ?1 || '%' ORDER BY id LIMIT 1",
            MEDICINE_COLUMNS
        );
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(fragment)
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Every medicine with its total stock and batch count, by name.
    pub async fn list_with_stock(&self) -> DbResult<Vec<MedicineStock>> {
        let rows = sqlx::query_as::<_, MedicineStock>(
            r#"
            SELECT
                m.id,
                m.name,
                m.category,
                m.composition,
                COALESCE(SUM(b.quantity), 0) AS total_stock,
                COUNT(b.id) AS batch_count
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            GROUP BY m.id
            ORDER BY m.name COLLATE NOCASE, m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Searches name, category and composition.
    ///
    /// Stock totals only count batches that have not expired as of `today`,
    /// since those are the only ones that can be sold.
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        today: NaiveDate,
    ) -> DbResult<Vec<MedicineStock>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit, "Searching medicines");

        let rows = sqlx::query_as::<_, MedicineStock>(
            r#"
            SELECT
                m.id,
                m.name,
                m.category,
                m.composition,
                COALESCE(SUM(CASE WHEN b.expiry_date >= ?2 THEN b.quantity END), 0) AS total_stock,
                COUNT(CASE WHEN b.expiry_date >= ?2 THEN b.id END) AS batch_count
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            WHERE ?1 = ''
               OR m.name LIKE '%' || ?1 || '%'
               OR m.category LIKE '%' || ?1 || '%'
               OR m.composition LIKE '%' || ?1 || '%'
            GROUP BY m.id
            ORDER BY m.name COLLATE NOCASE, m.id
            LIMIT ?3
            "#,
        )
        .bind(&query)
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Search returned medicines");
        Ok(rows)
    }

    /// Deletes a medicine and its batches.
    ///
    /// Refused with `MedicineHasSales` while any sale references one of its
    /// batches. Alerts survive with their references nulled.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM medicines WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CoreError::not_found("Medicine", id).into());
        }

        let sales: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales s
            JOIN batches b ON b.id = s.batch_id
            WHERE b.medicine_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if sales > 0 {
            return Err(CoreError::MedicineHasSales {
                medicine_id: id,
                sales,
            }
            .into());
        }

        sqlx::query("DELETE FROM medicines WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id, "Medicine deleted");
        Ok(())
    }

    /// Counts catalogue entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pharma_core::{CustomerInfo, Money, SaleLineRequest, SaleRequest, TaxRate};

    #[tokio::test]
    async fn test_create_and_update() {
        let db = fixtures::database().await;

        let created = db
            .medicines()
            .create(&MedicineInput::named("  Paracetamol 500mg ", "Analgesic"))
            .await
            .unwrap();
        assert_eq!(created.name, "Paracetamol 500mg");

        let mut input = MedicineInput::named("Paracetamol 650mg", "Analgesic");
        input.dosage = Some("1 tablet every 6 hours".to_string());
        let updated = db.medicines().update(created.id, &input).await.unwrap();

        assert_eq!(updated.name, "Paracetamol 650mg");
        assert_eq!(updated.dosage.as_deref(), Some("1 tablet every 6 hours"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let db = fixtures::database().await;
        let err = db
            .medicines()
            .create(&MedicineInput::named("   ", "General"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_missing_medicine() {
        let db = fixtures::database().await;
        let err = db
            .medicines()
            .update(999, &MedicineInput::named("Ghost", "None"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_with_stock_totals() {
        let db = fixtures::database().await;
        let pcm = fixtures::medicine(&db, "Paracetamol").await;
        let _ibu = fixtures::medicine(&db, "Ibuprofen").await;
        fixtures::batch(&db, pcm.id, "PCM-1", 40, 250, 200).await;
        fixtures::batch(&db, pcm.id, "PCM-2", 10, 250, 400).await;

        let rows = db.medicines().list_with_stock().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ibuprofen");
        assert_eq!(rows[0].total_stock, 0);
        assert_eq!(rows[0].batch_count, 0);
        assert_eq!(rows[1].total_stock, 50);
        assert_eq!(rows[1].batch_count, 2);
    }

    #[tokio::test]
    async fn test_search_ignores_expired_stock() {
        let db = fixtures::database().await;
        let pcm = fixtures::medicine(&db, "Paracetamol").await;
        fixtures::batch(&db, pcm.id, "PCM-OLD", 30, 250, -5).await;
        fixtures::batch(&db, pcm.id, "PCM-NEW", 12, 250, 90).await;

        let hits = db
            .medicines()
            .search("para", 20, fixtures::today())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].total_stock, 12);
        assert_eq!(hits[0].batch_count, 1);

        let none = db
            .medicines()
            .search("zzz", 20, fixtures::today())
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_name_fragment() {
        let db = fixtures::database().await;
        fixtures::medicine(&db, "Cetirizine 10mg").await;

        let hit = db
            .medicines()
            .find_by_name_fragment("cetirizine")
            .await
            .unwrap();
        assert_eq!(hit.unwrap().name, "Cetirizine 10mg");

        assert!(db
            .medicines()
            .find_by_name_fragment("Loratadine")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_without_sales_cascades_batches() {
        let db = fixtures::database().await;
        let med = fixtures::medicine(&db, "Omeprazole").await;
        fixtures::batch(&db, med.id, "OMZ-1", 30, 400, 100).await;

        db.medicines().delete(med.id).await.unwrap();

        assert!(db.medicines().get(med.id).await.unwrap().is_none());
        assert!(db
            .batches()
            .list_for_medicine(med.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_sales_forbidden() {
        let db = fixtures::database().await;
        let med = fixtures::medicine(&db, "Amoxicillin").await;
        let batch = fixtures::batch(&db, med.id, "AMX-1", 30, 1200, 100).await;

        let request = SaleRequest {
            customer: CustomerInfo::new("Ravi", "9000000001"),
            lines: vec![SaleLineRequest::new(batch.id, 1, Money::from_cents(1200))],
        };
        db.sales()
            .record_sale(&request, TaxRate::default())
            .await
            .unwrap();

        let err = db.medicines().delete(med.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::MedicineHasSales { sales: 1, .. })
        ));

        // Nothing was removed
        assert!(db.medicines().get(med.id).await.unwrap().is_some());
        assert_eq!(db.batches().get(batch.id).await.unwrap().unwrap().quantity, 29);
    }
}
