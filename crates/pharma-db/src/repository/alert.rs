//! # Alert Repository
//!
//! Deduplicated inserts, queries and acknowledgement of alerts.
//!
//! ## Dedup Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  candidate: low_stock "Paracetamol is running low (12 units left)"     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO alerts (...) SELECT ...                                   │
//! │  WHERE NOT EXISTS (                                                    │
//! │      unread alert, same type,                                          │
//! │      substr(message, 1, 50) = substr(candidate, 1, 50)                 │
//! │  )                                                                      │
//! │       │                                                                 │
//! │       ├── 1 row  → inserted                                             │
//! │       └── 0 rows → duplicate of an unread alert, skipped                │
//! │                                                                         │
//! │  The check and the insert are one statement, so two scans racing on   │
//! │  the same candidate cannot both insert it.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Alerts are never deleted. The only mutation is `is_read = 1`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use pharma_core::{Alert, AlertCandidate, AlertType, CoreError};

const ALERT_COLUMNS: &str = "id, alert_type, message, medicine_id, batch_id, medicine_name, \
                             batch_no, priority, is_read, created_at";

/// Repository for alert database operations.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: SqlitePool,
}

impl AlertRepository {
    /// Creates a new AlertRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AlertRepository { pool }
    }

    /// Inserts the candidate unless an unread alert of the same type shares
    /// its first `prefix_chars` characters.
    ///
    /// Returns the new alert id, or `None` when it was a duplicate.
    pub async fn insert_if_absent(
        &self,
        candidate: &AlertCandidate,
        prefix_chars: usize,
    ) -> DbResult<Option<i64>> {
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (
                alert_type, message, medicine_id, batch_id,
                medicine_name, batch_no, priority, is_read, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8
            WHERE NOT EXISTS (
                SELECT 1 FROM alerts
                WHERE alert_type = ?1
                  AND is_read = 0
                  AND substr(message, 1, ?9) = substr(?2, 1, ?9)
            )
            "#,
        )
        .bind(candidate.alert_type)
        .bind(&candidate.message)
        .bind(candidate.medicine_id)
        .bind(candidate.batch_id)
        .bind(&candidate.medicine_name)
        .bind(&candidate.batch_no)
        .bind(candidate.priority)
        .bind(Utc::now())
        .bind(prefix_chars as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                alert_type = %candidate.alert_type,
                message = %candidate.message,
                "Duplicate of an unread alert, skipped"
            );
            return Ok(None);
        }

        let id = result.last_insert_rowid();
        debug!(id, alert_type = %candidate.alert_type, priority = %candidate.priority, "Alert inserted");
        Ok(Some(id))
    }

    /// Gets an alert by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Alert>> {
        let sql = format!("SELECT {} FROM alerts WHERE id = ?1", ALERT_COLUMNS);
        let alert = sqlx::query_as::<_, Alert>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(alert)
    }

    /// Fetches several alerts by ID, newest first.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<Vec<Alert>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM alerts WHERE id IN ({}) ORDER BY created_at DESC, id DESC",
            ALERT_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, Alert>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Unread alerts, newest first.
    pub async fn list_unread(&self) -> DbResult<Vec<Alert>> {
        let sql = format!(
            "SELECT {} FROM alerts WHERE is_read = 0 ORDER BY created_at DESC, id DESC",
            ALERT_COLUMNS
        );
        let alerts = sqlx::query_as::<_, Alert>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(alerts)
    }

    /// The newest `limit` unread alerts, for live badges.
    pub async fn recent_unread(&self, limit: u32) -> DbResult<Vec<Alert>> {
        let sql = format!(
            "SELECT {} FROM alerts WHERE is_read = 0 ORDER BY created_at DESC, id DESC LIMIT ?1",
            ALERT_COLUMNS
        );
        let alerts = sqlx::query_as::<_, Alert>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(alerts)
    }

    /// Every alert, unread first, then newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Alert>> {
        let sql = format!(
            "SELECT {} FROM alerts ORDER BY is_read ASC, created_at DESC, id DESC",
            ALERT_COLUMNS
        );
        let alerts = sqlx::query_as::<_, Alert>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(alerts)
    }

    /// Marks one alert read. Marking an already-read alert is a no-op.
    pub async fn mark_read(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE alerts SET is_read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Alert", id).into());
        }

        debug!(id, "Alert marked read");
        Ok(())
    }

    /// Marks every unread alert read. Returns how many changed.
    pub async fn mark_all_read(&self) -> DbResult<u64> {
        let result = sqlx::query("UPDATE alerts SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;

        let changed = result.rows_affected();
        info!(changed, "All alerts marked read");
        Ok(changed)
    }

    /// Number of unread alerts.
    pub async fn unread_count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE is_read = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Number of alerts of one type, optionally only unread ones.
    pub async fn count_by_type(&self, alert_type: AlertType, unread_only: bool) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM alerts WHERE alert_type = ?1 AND (?2 = 0 OR is_read = 0)",
        )
        .bind(alert_type)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Total number of alerts ever raised.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
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
    use crate::error::DbError;
    use crate::fixtures;
    use pharma_core::AlertPriority;

    fn low_stock(message: &str) -> AlertCandidate {
        AlertCandidate {
            alert_type: AlertType::LowStock,
            message: message.to_string(),
            medicine_id: None,
            batch_id: None,
            medicine_name: Some("Paracetamol".to_string()),
            batch_no: None,
            priority: AlertPriority::Medium,
        }
    }

    #[tokio::test]
    async fn test_unread_duplicate_is_skipped() {
        let db = fixtures::database().await;
        let alerts = db.alerts();
        let candidate = low_stock("Paracetamol is running low (12 units left)");

        assert!(alerts.insert_if_absent(&candidate, 50).await.unwrap().is_some());
        assert!(alerts.insert_if_absent(&candidate, 50).await.unwrap().is_none());
        assert_eq!(alerts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dedup_compares_prefix_only() {
        let db = fixtures::database().await;
        let alerts = db.alerts();

        // Identical for the first 50 characters, different afterwards
        let first = low_stock("Batch AMOX-2025-0001 of Amoxicillin 500mg Capsules expires in 12 days");
        let second = low_stock("Batch AMOX-2025-0001 of Amoxicillin 500mg Capsules expires in 11 days");
        assert!(alerts.insert_if_absent(&first, 50).await.unwrap().is_some());
        assert!(alerts.insert_if_absent(&second, 50).await.unwrap().is_none());

        // Different type, same text: not a duplicate
        let mut other_type = first.clone();
        other_type.alert_type = AlertType::Expiry;
        assert!(alerts.insert_if_absent(&other_type, 50).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refires_after_mark_read() {
        let db = fixtures::database().await;
        let alerts = db.alerts();
        let candidate = low_stock("Paracetamol is running low (12 units left)");

        let id = alerts.insert_if_absent(&candidate, 50).await.unwrap().unwrap();
        alerts.mark_read(id).await.unwrap();

        let again = alerts.insert_if_absent(&candidate, 50).await.unwrap();
        assert!(again.is_some());
        assert_ne!(again, Some(id));
        assert_eq!(alerts.count().await.unwrap(), 2);
        assert_eq!(alerts.unread_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_all_orders_unread_first() {
        let db = fixtures::database().await;
        let alerts = db.alerts();

        let a = alerts.insert_if_absent(&low_stock("A is running low (1 units left)"), 50).await.unwrap().unwrap();
        let b = alerts.insert_if_absent(&low_stock("B is running low (2 units left)"), 50).await.unwrap().unwrap();
        let c = alerts.insert_if_absent(&low_stock("C is running low (3 units left)"), 50).await.unwrap().unwrap();
        alerts.mark_read(c).await.unwrap();

        let all: Vec<i64> = alerts.list_all().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(all, vec![b, a, c]);

        let unread: Vec<i64> = alerts.list_unread().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(unread, vec![b, a]);

        let recent = alerts.recent_unread(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, b);
    }

    #[tokio::test]
    async fn test_mark_read_missing_alert() {
        let db = fixtures::database().await;
        let err = db.alerts().mark_read(404).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let db = fixtures::database().await;
        let alerts = db.alerts();
        alerts.insert_if_absent(&low_stock("A is running low (1 units left)"), 50).await.unwrap();
        alerts.insert_if_absent(&low_stock("B is running low (2 units left)"), 50).await.unwrap();

        assert_eq!(alerts.mark_all_read().await.unwrap(), 2);
        assert_eq!(alerts.unread_count().await.unwrap(), 0);
        assert_eq!(alerts.mark_all_read().await.unwrap(), 0);
        assert_eq!(alerts.count_by_type(AlertType::LowStock, false).await.unwrap(), 2);
        assert_eq!(alerts.count_by_type(AlertType::LowStock, true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_alert_survives_medicine_deletion() {
        let db = fixtures::database().await;
        let med = fixtures::medicine(&db, "Omeprazole").await;
        let batch = fixtures::batch(&db, med.id, "OMZ-9", 3, 400, 5).await;

        let candidate = AlertCandidate {
            alert_type: AlertType::Expiry,
            message: "Batch OMZ-9 of Omeprazole expires in 5 days".to_string(),
            medicine_id: Some(med.id),
            batch_id: Some(batch.id),
            medicine_name: Some(med.name.clone()),
            batch_no: Some(batch.batch_no.clone()),
            priority: AlertPriority::High,
        };
        let id = db.alerts().insert_if_absent(&candidate, 50).await.unwrap().unwrap();

        db.medicines().delete(med.id).await.unwrap();

        let alert = db.alerts().get(id).await.unwrap().unwrap();
        assert_eq!(alert.medicine_id, None);
        assert_eq!(alert.batch_id, None);
        assert_eq!(alert.medicine_name.as_deref(), Some("Omeprazole"));
        assert_eq!(alert.batch_no.as_deref(), Some("OMZ-9"));
    }

    #[tokio::test]
    async fn test_get_many() {
        let db = fixtures::database().await;
        let alerts = db.alerts();
        let a = alerts.insert_if_absent(&low_stock("A is running low (1 units left)"), 50).await.unwrap().unwrap();
        let b = alerts.insert_if_absent(&low_stock("B is running low (2 units left)"), 50).await.unwrap().unwrap();

        let fetched = alerts.get_many(&[a, b]).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(alerts.get_many(&[]).await.unwrap().is_empty());
    }
}
