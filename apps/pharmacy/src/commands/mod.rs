//! # Commands Module
//!
//! Every operation the pharmacy front ends can call. A command takes the
//! shared [`AppContext`](crate::context::AppContext) plus its own arguments
//! and returns `ApiResult<T>`; `T` is always serde-serializable.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── sale.rs       ◄─── Sale transactions and the sales ledger
//! ├── alert.rs      ◄─── Alert list / acknowledge / badge / manual scan
//! ├── inventory.rs  ◄─── Medicines, batch receipt, interactions
//! ├── recommend.rs  ◄─── Symptom-based recommendations
//! └── report.rs     ◄─── Export rows for the report collaborator
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Command Flow                                       │
//! │                                                                         │
//! │  Front end (CLI, UI, polling badge)                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::sale::create_sale(&ctx, request)                            │
//! │         │                                                               │
//! │         ├── pharma-db repositories  (typed records, transactions)      │
//! │         ├── pharma-alerts engine    (scan, receipt-time check)         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Result<T, ApiError>  ──►  JSON                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod alert;
pub mod inventory;
pub mod recommend;
pub mod report;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, NaiveDate};
    use pharma_core::{Batch, Medicine, MedicineInput, NewBatch};
    use pharma_db::{Database, DbConfig};

    use crate::config::PharmacyConfig;
    use crate::context::AppContext;

    pub async fn context() -> AppContext {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppContext::from_database(db, PharmacyConfig::default())
    }

    pub async fn medicine(ctx: &AppContext, name: &str) -> Medicine {
        ctx.db()
            .medicines()
            .create(&MedicineInput::named(name, "General"))
            .await
            .unwrap()
    }

    /// Receives a batch directly through the repository, bypassing the
    /// receipt-time alert check.
    pub async fn batch(
        ctx: &AppContext,
        medicine_id: i64,
        batch_no: &str,
        quantity: i64,
        mrp_cents: i64,
        expiry: NaiveDate,
    ) -> Batch {
        ctx.db()
            .batches()
            .receive(&NewBatch {
                medicine_id,
                batch_no: batch_no.to_string(),
                quantity,
                mrp_cents,
                cost_price_cents: mrp_cents * 7 / 10,
                mfg_date: None,
                expiry_date: expiry,
                supplier: None,
            })
            .await
            .unwrap()
    }

    pub fn days_from_today(ctx: &AppContext, days: i64) -> NaiveDate {
        ctx.today() + Duration::days(days)
    }
}
