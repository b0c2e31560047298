//! # pharma-alerts: Inventory Alerting for the Pharmacy
//!
//! Turns the pure rules in `pharma_core::rules` into stored, deduplicated
//! alerts, and keeps doing so in the background.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Alerting Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 AlertScheduler (one per process)                 │  │
//! │  │                                                                  │  │
//! │  │  Started lazily by the app context on first sign-in              │  │
//! │  │  Every 5 minutes, 1 minute after a failed pass                   │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ ScanJob::run_scan                       │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        AlertEngine                               │  │
//! │  │                                                                  │  │
//! │  │  stock levels + expiring batches ──► rules ──► insert_if_absent  │  │
//! │  └───────────────┬───────────────────────────────────┬──────────────┘  │
//! │                  │                                   │                  │
//! │                  ▼                                   ▼                  │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │  pharma-db (alerts table)    │   │  AlertNotifier               │   │
//! │  │  list / mark read            │   │  AlertSummary of new alerts  │   │
//! │  └──────────────────────────────┘   └──────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - `[alerts]` settings: thresholds and intervals
//! - [`engine`] - One scan pass and receipt-time batch checks
//! - [`scheduler`] - The start-once background loop
//! - [`notifier`] - Summaries of newly raised alerts
//! - [`error`] - Alert error types
//!
//! ## Usage
//! ```rust,ignore
//! let engine = AlertEngine::new(db.clone(), settings.thresholds())
//!     .with_notifier(Arc::new(LogNotifier));
//! let scheduler = AlertScheduler::new(Arc::new(engine.clone()), &settings);
//!
//! scheduler.ensure_started().await;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod scheduler;

pub use config::AlertSettings;
pub use engine::{AlertEngine, ScanReport};
pub use error::{AlertError, AlertResult};
pub use notifier::{AlertNotifier, AlertSummary, AlertTypeCounts, LogNotifier};
pub use scheduler::{AlertScheduler, ScanJob, SchedulerStatus};
