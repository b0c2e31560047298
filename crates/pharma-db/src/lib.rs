//! # pharma-db: Database Layer for the Pharmacy
//!
//! This crate provides database access for the pharmacy inventory system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pharmacy Data Flow                               │
//! │                                                                         │
//! │  Command layer (sell, alerts, reports)     Alert scan loop              │
//! │       │                                          │                      │
//! │       ▼                                          ▼                      │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pharma-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │   │   │
//! │  │   │               │    │ MedicineRepo   │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ BatchRepo      │    │ 001_init.sql │   │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo  (tx) │    │ 002_int.sql  │   │   │
//! │  │   │               │    │ AlertRepo      │    │              │   │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir)/pharma.db                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharma_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pharma.db")).await?;
//! let receipt = db.sales().record_sale(&request, TaxRate::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::alert::AlertRepository;
pub use repository::batch::BatchRepository;
pub use repository::interaction::InteractionRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::report::{ReportPeriod, ReportRepository};
pub use repository::sale::SaleRepository;

// =============================================================================
// Test Fixtures
// =============================================================================
