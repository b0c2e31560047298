//! # Sale Commands
//!
//! The counter flow: one request, many lines, all or nothing.
//!
//! ```text
//! create_sale(request)
//!      │
//!      ├── validation fails          ──► VALIDATION_ERROR, nothing written
//!      ├── a batch is short          ──► INSUFFICIENT_STOCK, nothing written
//!      └── every line decremented    ──► Receipt (SA-000042, totals, tax)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use pharma_core::receipt::Receipt;
use pharma_core::{PaymentMethod, Sale, SaleRequest};

/// Default page size of the sales ledger.
pub const RECENT_SALES_LIMIT: u32 = 50;

/// One ledger line as shown in the sales history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineDto {
    pub id: i64,
    pub transaction_id: String,
    pub medicine_name: String,
    pub batch_no: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub sold_on: String,
}

impl From<Sale> for SaleLineDto {
    fn from(s: Sale) -> Self {
        SaleLineDto {
            id: s.id,
            line_total_cents: s.line_total().cents(),
            transaction_id: s.transaction_id,
            medicine_name: s.medicine_name,
            batch_no: s.batch_no,
            quantity: s.quantity_sold,
            unit_price_cents: s.selling_price_cents,
            customer_name: s.customer_name,
            customer_phone: s.customer_phone,
            payment_method: s.payment_method,
            sold_on: s.sold_on.to_rfc3339(),
        }
    }
}

/// Commits a sale and returns its receipt.
pub async fn create_sale(ctx: &AppContext, request: SaleRequest) -> ApiResult<Receipt> {
    debug!(lines = request.lines.len(), "create_sale command");

    let receipt = ctx
        .db()
        .sales()
        .record_sale(&request, ctx.tax_rate())
        .await?;

    info!(
        receipt = %receipt.receipt_number,
        units = receipt.unit_count(),
        "Sale completed"
    );
    Ok(receipt)
}

/// Most recent sale lines, newest first.
pub async fn recent_sales(ctx: &AppContext, limit: Option<u32>) -> ApiResult<Vec<SaleLineDto>> {
    let limit = limit.unwrap_or(RECENT_SALES_LIMIT).clamp(1, 500);
    let sales = ctx.db().sales().recent(limit).await?;
    Ok(sales.into_iter().map(SaleLineDto::from).collect())
}

/// Every line of one receipt.
pub async fn sales_for_transaction(
    ctx: &AppContext,
    transaction_id: &str,
) -> ApiResult<Vec<SaleLineDto>> {
    let sales = ctx.db().sales().by_transaction(transaction_id.trim()).await?;
    if sales.is_empty() {
        return Err(ApiError::not_found("Transaction", transaction_id));
    }
    Ok(sales.into_iter().map(SaleLineDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{batch, context, days_from_today, medicine};
    use crate::error::ErrorCode;
    use pharma_core::{CustomerInfo, Money, SaleLineRequest};

    fn request(lines: Vec<SaleLineRequest>) -> SaleRequest {
        SaleRequest {
            customer: CustomerInfo::new("Asha Rao", "9845012345"),
            lines,
        }
    }

    #[tokio::test]
    async fn test_receipt_totals() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        let ctz = medicine(&ctx, "Cetirizine").await;
        let a = batch(&ctx, pcm.id, "PCM-1", 50, 1000, days_from_today(&ctx, 200)).await;
        let b = batch(&ctx, ctz.id, "CTZ-1", 50, 500, days_from_today(&ctx, 200)).await;

        let receipt = create_sale(
            &ctx,
            request(vec![
                SaleLineRequest::new(a.id, 2, Money::from_cents(1000)),
                SaleLineRequest::new(b.id, 1, Money::from_cents(500)),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(receipt.subtotal_cents, 2500);
        assert_eq!(receipt.tax_cents, 125);
        assert_eq!(receipt.grand_total_cents, 2625);
        assert!(receipt.receipt_number.starts_with("SA-"));

        let lines = sales_for_transaction(&ctx, &receipt.transaction_id)
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total_cents, 2000);
    }

    #[tokio::test]
    async fn test_short_line_rejects_whole_sale() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        let a = batch(&ctx, pcm.id, "PCM-1", 50, 1000, days_from_today(&ctx, 200)).await;
        let b = batch(&ctx, pcm.id, "PCM-2", 12, 1000, days_from_today(&ctx, 200)).await;

        let err = create_sale(
            &ctx,
            request(vec![
                SaleLineRequest::new(a.id, 5, Money::from_cents(1000)),
                SaleLineRequest::new(b.id, 15, Money::from_cents(1000)),
            ]),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("available 12"));
        assert!(err.message.contains("requested 15"));

        let batches = ctx.db().batches();
        assert_eq!(batches.get(a.id).await.unwrap().unwrap().quantity, 50);
        assert_eq!(batches.get(b.id).await.unwrap().unwrap().quantity, 12);
        assert!(recent_sales(&ctx, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_customer_is_validation_error() {
        let ctx = context().await;
        let pcm = medicine(&ctx, "Paracetamol").await;
        let a = batch(&ctx, pcm.id, "PCM-1", 50, 1000, days_from_today(&ctx, 200)).await;

        let mut req = request(vec![SaleLineRequest::new(a.id, 1, Money::from_cents(1000))]);
        req.customer.name = "  ".to_string();

        let err = create_sale(&ctx, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_found() {
        let ctx = context().await;
        let err = sales_for_transaction(&ctx, "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
