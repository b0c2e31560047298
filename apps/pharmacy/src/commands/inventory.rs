//! # Inventory Commands
//!
//! Catalogue administration, stock receipt and interaction lookups.
//!
//! ## Receiving Stock
//! ```text
//! receive_batch(new_batch)
//!      │
//!      ├── validation / duplicate batch_no ──► error, nothing written
//!      │
//!      ▼
//! batches().receive()  ──►  engine.check_batch(id, today)
//!                                │
//!                                ├── expires within the window ──► alert now
//!                                └── otherwise                 ──► nothing
//! ```
//! The receipt-time alert uses the same message the periodic scan would
//! build, so the scan treats it as a duplicate.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use pharma_core::{Batch, Interaction, Medicine, MedicineInput, MedicineStock, NewBatch};

/// Default number of search hits.
pub const SEARCH_LIMIT: u32 = 20;

/// A received batch and the alert it raised, if any.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceivedBatch {
    pub batch: Batch,
    pub alert_id: Option<i64>,
}

/// A medicine with every batch on record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MedicineDetail {
    pub medicine: Medicine,
    pub batches: Vec<Batch>,
    pub total_stock: i64,
}

// =============================================================================
// Medicines
// =============================================================================

pub async fn create_medicine(ctx: &AppContext, input: MedicineInput) -> ApiResult<Medicine> {
    let medicine = ctx.db().medicines().create(&input).await?;
    info!(id = medicine.id, name = %medicine.name, "Medicine created");
    Ok(medicine)
}

pub async fn update_medicine(
    ctx: &AppContext,
    id: i64,
    input: MedicineInput,
) -> ApiResult<Medicine> {
    Ok(ctx.db().medicines().update(id, &input).await?)
}

pub async fn get_medicine(ctx: &AppContext, id: i64) -> ApiResult<MedicineDetail> {
    let medicine = ctx.db().medicines().require(id).await?;
    let batches = ctx.db().batches().list_for_medicine(id).await?;
    let total_stock = batches.iter().map(|b| b.quantity).sum();

    Ok(MedicineDetail {
        medicine,
        batches,
        total_stock,
    })
}

pub async fn list_medicines(ctx: &AppContext) -> ApiResult<Vec<MedicineStock>> {
    Ok(ctx.db().medicines().list_with_stock().await?)
}

/// Searches name, category and composition. Stock totals count only
/// batches that have not expired.
pub async fn search_medicines(
    ctx: &AppContext,
    query: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<MedicineStock>> {
    let limit = limit.unwrap_or(SEARCH_LIMIT).clamp(1, 100);
    debug!(query, limit, "search_medicines command");
    Ok(ctx.db().medicines().search(query, limit, ctx.today()).await?)
}

/// Deletes a medicine and its batches. Refused once it has sale history.
pub async fn delete_medicine(ctx: &AppContext, id: i64) -> ApiResult<()> {
    ctx.db().medicines().delete(id).await?;
    info!(id, "Medicine deleted");
    Ok(())
}

// =============================================================================
// Batches
// =============================================================================

/// Receives stock and raises its expiry alert straight away when due.
///
/// A failed alert check is logged; the batch is already committed.
pub async fn receive_batch(ctx: &AppContext, batch: NewBatch) -> ApiResult<ReceivedBatch> {
    let batch = ctx.db().batches().receive(&batch).await?;

    let alert_id = match ctx.engine().check_batch(batch.id, ctx.today()).await {
        Ok(id) => id,
        Err(e) => {
            warn!(batch_id = batch.id, error = %e, "Receipt-time alert check failed");
            None
        }
    };

    info!(
        batch_id = batch.id,
        batch_no = %batch.batch_no,
        quantity = batch.quantity,
        alerted = alert_id.is_some(),
        "Batch received"
    );

    Ok(ReceivedBatch { batch, alert_id })
}

/// Batches that can be sold today, earliest expiry first.
pub async fn sellable_batches(ctx: &AppContext, medicine_id: i64) -> ApiResult<Vec<Batch>> {
    ctx.db().medicines().require(medicine_id).await?;
    Ok(ctx.db().batches().sellable(medicine_id, ctx.today()).await?)
}

// =============================================================================
// Interactions
// =============================================================================

/// Looks up a known interaction between two drugs, in either order.
pub async fn check_interaction(
    ctx: &AppContext,
    drug_a: &str,
    drug_b: &str,
) -> ApiResult<Option<Interaction>> {
    Ok(ctx.db().interactions().check(drug_a, drug_b).await?)
}

/// Every known interaction involving `drug`.
pub async fn interactions_for(ctx: &AppContext, drug: &str) -> ApiResult<Vec<Interaction>> {
    if drug.trim().is_empty() {
        return Err(ApiError::validation("drug is required"));
    }
    Ok(ctx.db().interactions().list_for(drug).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sale::create_sale;
    use crate::commands::test_support::{batch, context, days_from_today, medicine};
    use crate::error::ErrorCode;
    use pharma_core::{AlertType, CustomerInfo, Money, SaleLineRequest, SaleRequest};

    fn new_batch(ctx: &AppContext, medicine_id: i64, batch_no: &str, days: i64) -> NewBatch {
        NewBatch {
            medicine_id,
            batch_no: batch_no.to_string(),
            quantity: 100,
            mrp_cents: 1000,
            cost_price_cents: 700,
            mfg_date: None,
            expiry_date: days_from_today(ctx, days),
            supplier: Some("Medline Distributors".to_string()),
        }
    }

    #[tokio::test]
    async fn test_receiving_short_dated_stock_alerts_immediately() {
        let ctx = context().await;
        let amx = medicine(&ctx, "Amoxicillin").await;

        let received = receive_batch(&ctx, new_batch(&ctx, amx.id, "AMX-1", 5))
            .await
            .unwrap();
        let alert_id = received.alert_id.unwrap();
        let alert = ctx.db().alerts().get(alert_id).await.unwrap().unwrap();
        assert_eq!(alert.alert_type, AlertType::Expiry);

        // Long-dated stock raises nothing
        let healthy = receive_batch(&ctx, new_batch(&ctx, amx.id, "AMX-2", 400))
            .await
            .unwrap();
        assert_eq!(healthy.alert_id, None);
    }

    #[tokio::test]
    async fn test_duplicate_batch_number() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        receive_batch(&ctx, new_batch(&ctx, pcm.id, "PCM-1", 200))
            .await
            .unwrap();

        let err = receive_batch(&ctx, new_batch(&ctx, pcm.id, "PCM-1", 300))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateBatchNumber);
    }

    #[tokio::test]
    async fn test_delete_refused_with_sales_history() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        let b = batch(&ctx, pcm.id, "PCM-1", 10, 1000, days_from_today(&ctx, 200)).await;

        create_sale(
            &ctx,
            SaleRequest {
                customer: CustomerInfo::new("Ravi", "9000000000"),
                lines: vec![SaleLineRequest::new(b.id, 1, Money::from_cents(1000))],
            },
        )
        .await
        .unwrap();

        let err = delete_medicine(&ctx, pcm.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let unsold = medicine(&ctx, "Cetirizine").await;
        delete_medicine(&ctx, unsold.id).await.unwrap();
        let err = get_medicine(&ctx, unsold.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_sellable_excludes_expired_and_empty() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        batch(&ctx, pcm.id, "PCM-LATE", 10, 1000, days_from_today(&ctx, 300)).await;
        batch(&ctx, pcm.id, "PCM-SOON", 10, 1000, days_from_today(&ctx, 20)).await;
        batch(&ctx, pcm.id, "PCM-OLD", 10, 1000, days_from_today(&ctx, -3)).await;
        batch(&ctx, pcm.id, "PCM-NONE", 0, 1000, days_from_today(&ctx, 100)).await;

        let sellable = sellable_batches(&ctx, pcm.id).await.unwrap();
        let numbers: Vec<_> = sellable.iter().map(|b| b.batch_no.as_str()).collect();
        assert_eq!(numbers, vec!["PCM-SOON", "PCM-LATE"]);

        let detail = get_medicine(&ctx, pcm.id).await.unwrap();
        assert_eq!(detail.batches.len(), 4);
        assert_eq!(detail.total_stock, 30);
    }

    #[tokio::test]
    async fn test_search_and_interactions() {
        let ctx = context().await;
        create_medicine(&ctx, MedicineInput::named("Ibuprofen 400mg", "Pain Relief"))
            .await
            .unwrap();
        medicine(&ctx, "Omeprazole").await;

        let hits = search_medicines(&ctx, "pain", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ibuprofen 400mg");

        let interaction = check_interaction(&ctx, "aspirin", "WARFARIN").await.unwrap();
        assert!(interaction.is_some());
        assert!(check_interaction(&ctx, "water", "salt").await.unwrap().is_none());

        let err = check_interaction(&ctx, " ", "salt").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
