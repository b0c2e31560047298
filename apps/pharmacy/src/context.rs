//! # Application Context
//!
//! Everything a command needs, built once at process start and passed by
//! reference. There is no global state: the database handle, the alert
//! engine and the single scheduler all hang off this value.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppContext                                     │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │   Database   │  │ AlertEngine  │  │  Arc<AlertScheduler>         │  │
//! │  │  (sqlx pool) │◄─┤ thresholds   │◄─┤  idle until first sign-in    │  │
//! │  └──────────────┘  │ LogNotifier  │  └──────────────────────────────┘  │
//! │                    └──────────────┘                                     │
//! │  ┌──────────────────────┐  ┌──────────────────────────────────────┐    │
//! │  │ Arc<PharmacyConfig>  │  │ Arc<dyn SymptomClassifier>           │    │
//! │  │ read-only            │  │ UnavailableClassifier by default     │    │
//! │  └──────────────────────┘  └──────────────────────────────────────┘    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • AlertScheduler: atomic start guard, task handle behind a Mutex     │
//! │  • Config: read-only after load                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::info;

use crate::classifier::{SymptomClassifier, UnavailableClassifier};
use crate::config::PharmacyConfig;
use crate::error::{ApiError, ApiResult};
use pharma_alerts::{AlertEngine, AlertScheduler, LogNotifier};
use pharma_core::TaxRate;
use pharma_db::{Database, DbConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppContext {
    db: Database,
    config: Arc<PharmacyConfig>,
    engine: AlertEngine,
    scheduler: Arc<AlertScheduler>,
    classifier: Arc<dyn SymptomClassifier>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("engine", &self.engine)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl AppContext {
    /// Opens the database named by `config` and wires everything up.
    pub async fn build(config: PharmacyConfig) -> ApiResult<Self> {
        let path = config
            .database_path()
            .map_err(|e| ApiError::internal(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    tracing::error!(?parent, "Failed to create data directory: {}", e);
                    ApiError::internal("Could not create the data directory")
                })?;
            }
        }

        info!(?path, "Opening pharmacy database");
        let db = Database::new(
            DbConfig::new(path).max_connections(config.database.max_connections),
        )
        .await?;

        Ok(Self::from_database(db, config))
    }

    /// Wires the context around an already-open database.
    pub fn from_database(db: Database, config: PharmacyConfig) -> Self {
        let mut engine = AlertEngine::new(db.clone(), config.alerts.thresholds());
        if config.alerts.notify {
            engine = engine.with_notifier(Arc::new(LogNotifier));
        }

        let scheduler = Arc::new(AlertScheduler::new(
            Arc::new(engine.clone()),
            &config.alerts,
        ));

        AppContext {
            db,
            config: Arc::new(config),
            engine,
            scheduler,
            classifier: Arc::new(UnavailableClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SymptomClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &PharmacyConfig {
        &self.config
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub fn classifier(&self) -> &dyn SymptomClassifier {
        self.classifier.as_ref()
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.config.tax_rate()
    }

    /// The calendar date used for expiry decisions.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// Hook for a successful sign-in. Starts the alert scheduler the first
    /// time; later calls do nothing.
    pub async fn on_authenticated(&self) -> bool {
        self.scheduler.ensure_started().await
    }

    /// Stops the scheduler and closes the pool.
    pub async fn shutdown(&self) {
        if let Err(e) = self.scheduler.shutdown().await {
            tracing::warn!(error = %e, "Alert scheduler did not stop cleanly");
        }
        self.db.close().await;
        info!("Pharmacy context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scheduler_starts_once_on_authentication() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ctx = AppContext::from_database(db, PharmacyConfig::default());

        assert!(!ctx.scheduler().is_running());
        assert!(ctx.on_authenticated().await);
        assert!(!ctx.on_authenticated().await);
        assert!(ctx.scheduler().is_running());

        ctx.shutdown().await;
        assert!(!ctx.scheduler().is_running());
    }

    #[tokio::test]
    async fn test_build_creates_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PharmacyConfig::default();
        config.database.path = Some(dir.path().join("nested").join("pharma.db"));

        let ctx = AppContext::build(config).await.unwrap();
        assert!(ctx.db().health_check().await);
        assert_eq!(ctx.tax_rate().bps(), 500);
        ctx.shutdown().await;
    }
}
