//! # Repository Module
//!
//! Database repository implementations for the pharmacy store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command layer                                                         │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(&request, tax_rate)                    │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── record_sale(&self, request, rate)   ← one transaction             │
//! │  ├── recent(&self, limit)                                              │
//! │  └── by_transaction(&self, id)                                         │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`medicine::MedicineRepository`] - Medicine catalogue CRUD and search
//! - [`batch::BatchRepository`] - Stock receipt, sellable batches, rule inputs
//! - [`sale::SaleRepository`] - The atomic sale transaction and the ledger
//! - [`alert::AlertRepository`] - Deduplicated inserts, queries, acknowledgement
//! - [`interaction::InteractionRepository`] - Drug interaction lookup
//! - [`report::ReportRepository`] - Aggregations for reports

pub mod alert;
pub mod batch;
pub mod interaction;
pub mod medicine;
pub mod report;
pub mod sale;
