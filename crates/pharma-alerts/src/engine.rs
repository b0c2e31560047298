//! # Alert Engine
//!
//! One scan pass: read the inventory, evaluate the rules, insert whatever
//! is not already covered by an unread alert.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AlertEngine::scan_at(today)                     │
//! │                                                                         │
//! │  1. Read    batches().stock_levels()          one row per medicine     │
//! │             batches().expiry_rows(today+30)   batches with stock left  │
//! │                                                                         │
//! │  2. Rules   pharma_core::rules::evaluate(...)  → Vec<AlertCandidate>   │
//! │                                                                         │
//! │  3. Insert  for each candidate:                                        │
//! │               alerts().insert_if_absent(candidate, 50)                 │
//! │                 Ok(Some(id)) → inserted                                │
//! │                 Ok(None)     → duplicate of an unread alert            │
//! │                 Err(e)       → warn!, counted as failed, keep going    │
//! │                                                                         │
//! │  4. Notify  inserted > 0 → AlertSummary → notifier (errors logged)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure in step 1 fails the whole pass. Nothing has been written at
//! that point, so the scheduler simply retries later.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AlertResult;
use crate::notifier::{AlertNotifier, AlertSummary};
use pharma_core::rules::{self, AlertThresholds};
use pharma_core::AlertType;
use pharma_db::Database;

// =============================================================================
// Scan Report
// =============================================================================

/// Outcome of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Candidates the rules produced.
    pub evaluated: usize,
    pub low_stock_inserted: usize,
    pub expiry_inserted: usize,
    pub expired_inserted: usize,
    /// Candidates skipped because an unread alert already covers them.
    pub duplicates: usize,
    /// Candidates whose insert failed.
    pub failed: usize,
    /// Ids of the alerts this pass inserted.
    pub inserted_ids: Vec<i64>,
}

impl ScanReport {
    pub fn inserted(&self) -> usize {
        self.low_stock_inserted + self.expiry_inserted + self.expired_inserted
    }

    fn record_insert(&mut self, alert_type: AlertType, id: i64) {
        match alert_type {
            AlertType::LowStock => self.low_stock_inserted += 1,
            AlertType::Expiry => self.expiry_inserted += 1,
            AlertType::Expired => self.expired_inserted += 1,
        }
        self.inserted_ids.push(id);
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Evaluates the alert rules against the database.
///
/// Holds no state between passes; cloning shares the pool and notifier.
#[derive(Clone)]
pub struct AlertEngine {
    db: Database,
    thresholds: AlertThresholds,
    notifier: Option<Arc<dyn AlertNotifier>>,
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEngine")
            .field("thresholds", &self.thresholds)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

impl AlertEngine {
    pub fn new(db: Database, thresholds: AlertThresholds) -> Self {
        AlertEngine {
            db,
            thresholds,
            notifier: None,
        }
    }

    /// Sends a summary to `notifier` after every pass that inserted alerts.
    pub fn with_notifier(mut self, notifier: Arc<dyn AlertNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Runs a pass for the local calendar date.
    pub async fn scan(&self) -> AlertResult<ScanReport> {
        self.scan_at(Local::now().date_naive()).await
    }

    /// Runs a pass as if today were `today`.
    pub async fn scan_at(&self, today: NaiveDate) -> AlertResult<ScanReport> {
        debug!(%today, "Alert scan starting");

        let batches = self.db.batches();
        let levels = batches.stock_levels().await?;
        let horizon = today + Duration::days(self.thresholds.near_expiry_days);
        let expiring = batches.expiry_rows(horizon).await?;

        let candidates = rules::evaluate(&levels, &expiring, today, &self.thresholds);

        let mut report = ScanReport {
            evaluated: candidates.len(),
            ..ScanReport::default()
        };

        let alerts = self.db.alerts();
        for candidate in &candidates {
            match alerts
                .insert_if_absent(candidate, self.thresholds.dedup_prefix_chars)
                .await
            {
                Ok(Some(id)) => report.record_insert(candidate.alert_type, id),
                Ok(None) => report.duplicates += 1,
                Err(e) => {
                    warn!(
                        alert_type = %candidate.alert_type,
                        message = %candidate.message,
                        error = %e,
                        "Failed to insert alert"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            inserted = report.inserted(),
            duplicates = report.duplicates,
            failed = report.failed,
            "Alert scan complete"
        );

        if !report.inserted_ids.is_empty() {
            self.notify(&report.inserted_ids).await;
        }

        Ok(report)
    }

    /// Raises the expiry alert for one batch right away, if it needs one.
    ///
    /// Used when stock is received. The message matches what the periodic
    /// scan would produce, so the scan dedups against it.
    pub async fn check_batch(&self, batch_id: i64, today: NaiveDate) -> AlertResult<Option<i64>> {
        let Some(row) = self.db.batches().expiry_row(batch_id).await? else {
            return Ok(None);
        };

        let Some(candidate) = rules::evaluate_expiry(&row, today, &self.thresholds) else {
            return Ok(None);
        };

        let inserted = self
            .db
            .alerts()
            .insert_if_absent(&candidate, self.thresholds.dedup_prefix_chars)
            .await?;

        if let Some(id) = inserted {
            info!(id, batch_id, alert_type = %candidate.alert_type, "Alert raised on receipt");
        }

        Ok(inserted)
    }

    async fn notify(&self, ids: &[i64]) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let alerts = match self.db.alerts().get_many(ids).await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "Could not load new alerts for notification");
                return;
            }
        };

        let summary = AlertSummary::from_alerts(&alerts);
        if let Err(e) = notifier.notify(&summary).await {
            warn!(error = %e, "Alert notification failed");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use async_trait::async_trait;
    use pharma_core::{AlertPriority, MedicineInput, NewBatch};
    use pharma_db::DbConfig;
    use std::sync::Mutex;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock(db: &Database, name: &str, batch_no: &str, quantity: i64, days: i64) -> (i64, i64) {
        let medicine = match db.medicines().find_by_name_fragment(name).await.unwrap() {
            Some(m) => m,
            None => db
                .medicines()
                .create(&MedicineInput::named(name, "General"))
                .await
                .unwrap(),
        };
        let batch = db
            .batches()
            .receive(&NewBatch {
                medicine_id: medicine.id,
                batch_no: batch_no.to_string(),
                quantity,
                mrp_cents: 1000,
                cost_price_cents: 700,
                mfg_date: None,
                expiry_date: today() + Duration::days(days),
                supplier: None,
            })
            .await
            .unwrap();
        (medicine.id, batch.id)
    }

    #[derive(Default)]
    struct RecordingNotifier {
        summaries: Mutex<Vec<AlertSummary>>,
        fail: bool,
    }

    #[async_trait]
    impl AlertNotifier for RecordingNotifier {
        async fn notify(&self, summary: &AlertSummary) -> AlertResult<()> {
            self.summaries.lock().unwrap().push(summary.clone());
            if self.fail {
                return Err(AlertError::Notification("mail server down".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_scan_inserts_nothing() {
        let db = database().await;
        stock(&db, "Paracetamol", "PCM-1", 12, 200).await;
        stock(&db, "Amoxicillin", "AMX-1", 40, 5).await;
        stock(&db, "Cetirizine", "CTZ-1", 30, -1).await;

        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());

        let first = engine.scan_at(today()).await.unwrap();
        assert_eq!(first.evaluated, 3);
        assert_eq!(first.low_stock_inserted, 1);
        assert_eq!(first.expiry_inserted, 1);
        assert_eq!(first.expired_inserted, 1);
        assert_eq!(first.failed, 0);

        let second = engine.scan_at(today()).await.unwrap();
        assert_eq!(second.evaluated, 3);
        assert_eq!(second.inserted(), 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(db.alerts().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_refires_only_after_acknowledged() {
        let db = database().await;
        stock(&db, "Paracetamol", "PCM-1", 12, 200).await;
        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());

        let first = engine.scan_at(today()).await.unwrap();
        let id = first.inserted_ids[0];
        let alert = db.alerts().get(id).await.unwrap().unwrap();
        assert_eq!(alert.message, "Paracetamol is running low (12 units left)");
        assert_eq!(alert.priority, AlertPriority::Medium);

        assert_eq!(engine.scan_at(today()).await.unwrap().inserted(), 0);

        db.alerts().mark_read(id).await.unwrap();

        let third = engine.scan_at(today()).await.unwrap();
        assert_eq!(third.low_stock_inserted, 1);
        assert_ne!(third.inserted_ids[0], id);
    }

    #[tokio::test]
    async fn test_low_stock_boundaries() {
        let db = database().await;
        stock(&db, "Exactly Twenty", "B-20", 20, 400).await;
        stock(&db, "Exactly Five", "B-5", 5, 400).await;
        stock(&db, "Twenty One", "B-21", 21, 400).await;
        stock(&db, "Empty", "B-0", 0, 400).await;

        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());
        let report = engine.scan_at(today()).await.unwrap();
        assert_eq!(report.low_stock_inserted, 2);

        let alerts = db.alerts().list_unread().await.unwrap();
        let priority_of = |name: &str| {
            alerts
                .iter()
                .find(|a| a.medicine_name.as_deref() == Some(name))
                .map(|a| a.priority)
        };
        assert_eq!(priority_of("Exactly Twenty"), Some(AlertPriority::Medium));
        assert_eq!(priority_of("Exactly Five"), Some(AlertPriority::High));
        assert_eq!(priority_of("Twenty One"), None);
        assert_eq!(priority_of("Empty"), None);
    }

    #[tokio::test]
    async fn test_expiry_boundaries() {
        let db = database().await;
        // Plenty of stock so low-stock never fires
        stock(&db, "Thirty", "EXP-30", 100, 30).await;
        stock(&db, "Seven", "EXP-7", 100, 7).await;
        stock(&db, "ThirtyOne", "EXP-31", 100, 31).await;
        stock(&db, "Yesterday", "EXP-M1", 100, -1).await;

        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());
        let report = engine.scan_at(today()).await.unwrap();
        assert_eq!(report.expiry_inserted, 2);
        assert_eq!(report.expired_inserted, 1);

        let alerts = db.alerts().list_unread().await.unwrap();
        let find = |batch_no: &str| alerts.iter().find(|a| a.batch_no.as_deref() == Some(batch_no));

        let thirty = find("EXP-30").unwrap();
        assert_eq!((thirty.alert_type, thirty.priority), (AlertType::Expiry, AlertPriority::Medium));
        assert_eq!(thirty.message, "Batch EXP-30 of Thirty expires in 30 days");

        let seven = find("EXP-7").unwrap();
        assert_eq!((seven.alert_type, seven.priority), (AlertType::Expiry, AlertPriority::High));

        assert!(find("EXP-31").is_none());

        let expired = find("EXP-M1").unwrap();
        assert_eq!((expired.alert_type, expired.priority), (AlertType::Expired, AlertPriority::High));
    }

    #[tokio::test]
    async fn test_notifier_called_only_when_something_inserted() {
        let db = database().await;
        stock(&db, "Paracetamol", "PCM-1", 3, 5).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let engine = AlertEngine::new(db.clone(), AlertThresholds::default())
            .with_notifier(notifier.clone());

        engine.scan_at(today()).await.unwrap();
        engine.scan_at(today()).await.unwrap();

        let summaries = notifier.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total, 2);
        assert_eq!(summaries[0].high, 2);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_scan() {
        let db = database().await;
        stock(&db, "Paracetamol", "PCM-1", 3, 200).await;

        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let engine = AlertEngine::new(db.clone(), AlertThresholds::default())
            .with_notifier(notifier.clone());

        let report = engine.scan_at(today()).await.unwrap();
        assert_eq!(report.inserted(), 1);
    }

    #[tokio::test]
    async fn test_check_batch_matches_scan_message() {
        let db = database().await;
        let (_, batch_id) = stock(&db, "Amoxicillin", "AMX-9", 50, 5).await;
        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());

        let raised = engine.check_batch(batch_id, today()).await.unwrap();
        assert!(raised.is_some());

        // The scan sees the same message and skips it
        let report = engine.scan_at(today()).await.unwrap();
        assert_eq!(report.expiry_inserted, 0);
        assert_eq!(report.duplicates, 1);

        let (_, healthy) = stock(&db, "Amoxicillin", "AMX-10", 50, 300).await;
        assert_eq!(engine.check_batch(healthy, today()).await.unwrap(), None);
        assert_eq!(engine.check_batch(9999, today()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_block_other_candidates() {
        let db = database().await;
        stock(&db, "Paracetamol", "PCM-1", 12, 200).await;
        stock(&db, "Amoxicillin", "BAD-1", 40, 5).await;
        stock(&db, "Cetirizine", "CTZ-1", 30, -1).await;

        sqlx::query(
            r#"
            CREATE TRIGGER reject_bad_batch BEFORE INSERT ON alerts
            WHEN NEW.message LIKE 'Batch BAD%'
            BEGIN
                SELECT RAISE(ABORT, 'rejected by trigger');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());
        let report = engine.scan_at(today()).await.unwrap();

        assert_eq!(report.evaluated, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.low_stock_inserted, 1);
        assert_eq!(report.expiry_inserted, 0);
        assert_eq!(report.expired_inserted, 1);

        let messages: Vec<_> = db
            .alerts()
            .list_unread()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&"Paracetamol is running low (12 units left)".to_string()));
        assert!(messages.contains(&"Batch CTZ-1 of Cetirizine has expired".to_string()));
    }

    #[tokio::test]
    async fn test_scan_fails_when_store_is_closed() {
        let db = database().await;
        let engine = AlertEngine::new(db.clone(), AlertThresholds::default());
        db.close().await;

        let err = engine.scan_at(today()).await.unwrap_err();
        assert!(matches!(err, AlertError::Database(_)));
    }
}
