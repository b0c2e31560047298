//! # Report Repository
//!
//! Read-only aggregations over sales and stock. These are the rows the
//! export layer turns into tables; formatting happens elsewhere.
//!
//! ## Date Handling
//! Sale timestamps are stored in UTC, so a sale belongs to the UTC calendar
//! day of its `sold_on`. Batch expiry dates are plain calendar dates.
//!
//! Every query takes `today` from the caller.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;

use crate::error::DbResult;
use pharma_core::{PaymentMethod, ValidationError};

// =============================================================================
// Report Period
// =============================================================================

/// The date window a sales report covers, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 90 days.
    Quarter,
    /// Last 365 days.
    Year,
    Custom {
        #[ts(as = "String")]
        start: NaiveDate,
        #[ts(as = "String")]
        end: NaiveDate,
    },
}

impl ReportPeriod {
    /// A custom window. `start` must not be after `end`.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::Mismatch {
                field: "start_date".to_string(),
                reason: "start date is after end date".to_string(),
            });
        }
        Ok(ReportPeriod::Custom { start, end })
    }

    /// `(start, end)` relative to `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let back = |days: i64| (today - Duration::days(days), today);
        match *self {
            ReportPeriod::Today => (today, today),
            ReportPeriod::Week => back(7),
            ReportPeriod::Month => back(30),
            ReportPeriod::Quarter => back(90),
            ReportPeriod::Year => back(365),
            ReportPeriod::Custom { start, end } => (start, end),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ReportPeriod::Today => "Today".to_string(),
            ReportPeriod::Week => "Last 7 days".to_string(),
            ReportPeriod::Month => "Last 30 days".to_string(),
            ReportPeriod::Quarter => "Last 90 days".to_string(),
            ReportPeriod::Year => "Last 365 days".to_string(),
            ReportPeriod::Custom { start, end } => format!("{} to {}", start, end),
        }
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(ReportPeriod::Today),
            "week" => Ok(ReportPeriod::Week),
            "month" => Ok(ReportPeriod::Month),
            "quarter" => Ok(ReportPeriod::Quarter),
            "year" => Ok(ReportPeriod::Year),
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("unknown period '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Report Rows
// =============================================================================

/// Sales totals for one period. Revenue is before tax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct SalesSummary {
    /// Distinct receipts.
    pub transactions: i64,
    /// Sale rows (receipt lines).
    pub line_items: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
    /// Distinct customer phone numbers.
    pub unique_customers: i64,
    /// Mean line value, rounded to the nearest cent.
    pub average_line_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub transactions: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct TopMedicine {
    pub medicine_name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    pub payment_method: PaymentMethod,
    pub transactions: i64,
    pub revenue_cents: i64,
}

/// Stock on hand in batches that have not expired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventorySummary {
    pub medicines: i64,
    pub batches: i64,
    pub total_units: i64,
    /// Units valued at MRP.
    pub stock_value_cents: i64,
    /// Units valued at cost price.
    pub cost_value_cents: i64,
    /// (stock value - cost value) / cost value, in basis points. 0 with no cost.
    pub margin_bps: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryTotals {
    medicines: i64,
    batches: i64,
    total_units: i64,
    stock_value_cents: i64,
    cost_value_cents: i64,
}

/// Batch counts by time left to expiry. Every batch counts, empty or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct ExpiryBuckets {
    pub expired: i64,
    /// Expiring today through 15 days out.
    pub within_15_days: i64,
    /// 16 to 90 days out.
    pub within_90_days: i64,
    pub beyond_90_days: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for reporting aggregations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn sales_summary(&self, period: ReportPeriod, today: NaiveDate) -> DbResult<SalesSummary> {
        let (start, end) = period.range(today);

        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COUNT(DISTINCT transaction_id) AS transactions,
                COUNT(*) AS line_items,
                COALESCE(SUM(quantity_sold), 0) AS units_sold,
                COALESCE(SUM(quantity_sold * selling_price_cents), 0) AS revenue_cents,
                COUNT(DISTINCT customer_phone) AS unique_customers,
                CAST(COALESCE(ROUND(AVG(quantity_sold * selling_price_cents)), 0) AS INTEGER)
                    AS average_line_cents
            FROM sales
            WHERE substr(sold_on, 1, 10) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// One row per day that had sales, oldest first.
    pub async fn daily_breakdown(&self, period: ReportPeriod, today: NaiveDate) -> DbResult<Vec<DailySales>> {
        let (start, end) = period.range(today);

        let days = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                substr(sold_on, 1, 10) AS day,
                COUNT(DISTINCT transaction_id) AS transactions,
                SUM(quantity_sold) AS units_sold,
                SUM(quantity_sold * selling_price_cents) AS revenue_cents
            FROM sales
            WHERE substr(sold_on, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY substr(sold_on, 1, 10)
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(days)
    }

    /// Best sellers by units, grouped on the name recorded at sale time.
    pub async fn top_medicines(
        &self,
        period: ReportPeriod,
        today: NaiveDate,
        limit: u32,
    ) -> DbResult<Vec<TopMedicine>> {
        let (start, end) = period.range(today);

        let top = sqlx::query_as::<_, TopMedicine>(
            r#"
            SELECT
                medicine_name,
                SUM(quantity_sold) AS units_sold,
                SUM(quantity_sold * selling_price_cents) AS revenue_cents
            FROM sales
            WHERE substr(sold_on, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY medicine_name
            ORDER BY units_sold DESC, revenue_cents DESC, medicine_name
            LIMIT ?3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(top)
    }

    pub async fn payment_breakdown(
        &self,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> DbResult<Vec<PaymentBreakdown>> {
        let (start, end) = period.range(today);

        let rows = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT
                payment_method,
                COUNT(DISTINCT transaction_id) AS transactions,
                SUM(quantity_sold * selling_price_cents) AS revenue_cents
            FROM sales
            WHERE substr(sold_on, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY payment_method
            ORDER BY revenue_cents DESC, payment_method
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn inventory_summary(&self, today: NaiveDate) -> DbResult<InventorySummary> {
        let totals = sqlx::query_as::<_, InventoryTotals>(
            r#"
            SELECT
                COUNT(DISTINCT m.id) AS medicines,
                COUNT(b.id) AS batches,
                COALESCE(SUM(b.quantity), 0) AS total_units,
                COALESCE(SUM(b.quantity * b.mrp_cents), 0) AS stock_value_cents,
                COALESCE(SUM(b.quantity * b.cost_price_cents), 0) AS cost_value_cents
            FROM medicines m
            LEFT JOIN batches b ON b.medicine_id = m.id
            WHERE b.id IS NULL OR b.expiry_date >= ?1
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(InventorySummary {
            medicines: totals.medicines,
            batches: totals.batches,
            total_units: totals.total_units,
            stock_value_cents: totals.stock_value_cents,
            cost_value_cents: totals.cost_value_cents,
            margin_bps: margin_bps(totals.stock_value_cents, totals.cost_value_cents),
        })
    }

    pub async fn expiry_buckets(&self, today: NaiveDate) -> DbResult<ExpiryBuckets> {
        let buckets = sqlx::query_as::<_, ExpiryBuckets>(
            r#"
            SELECT
                COUNT(CASE WHEN expiry_date < ?1 THEN 1 END) AS expired,
                COUNT(CASE WHEN expiry_date BETWEEN ?1 AND ?2 THEN 1 END) AS within_15_days,
                COUNT(CASE WHEN expiry_date > ?2 AND expiry_date <= ?3 THEN 1 END) AS within_90_days,
                COUNT(CASE WHEN expiry_date > ?3 THEN 1 END) AS beyond_90_days
            FROM batches
            "#,
        )
        .bind(today)
        .bind(today + Duration::days(15))
        .bind(today + Duration::days(90))
        .fetch_one(&self.pool)
        .await?;

        Ok(buckets)
    }
}

fn margin_bps(stock_value: i64, cost_value: i64) -> i64 {
    if cost_value <= 0 {
        return 0;
    }
    let diff = (stock_value - cost_value) as i128 * 10_000;
    (diff / cost_value as i128) as i64
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Utc;
    use pharma_core::{CustomerInfo, Money, SaleLineRequest, SaleRequest, TaxRate};

    async fn sell(db: &crate::Database, phone: &str, method: PaymentMethod, lines: Vec<SaleLineRequest>) {
        let mut customer = CustomerInfo::new("Walk-in", phone);
        customer.payment_method = method;
        db.sales()
            .record_sale(&SaleRequest { customer, lines }, TaxRate::default())
            .await
            .unwrap();
    }

    #[test]
    fn test_period_ranges() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(ReportPeriod::Today.range(today), (today, today));
        assert_eq!(
            ReportPeriod::Week.range(today).0,
            NaiveDate::from_ymd_opt(2026, 3, 24).unwrap()
        );
        assert_eq!(
            ReportPeriod::Month.range(today).0,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(ReportPeriod::Year.range(today).1, today);

        assert!(ReportPeriod::custom(today, today).is_ok());
        assert!(ReportPeriod::custom(today, today - Duration::days(1)).is_err());
        assert_eq!("QUARTER".parse::<ReportPeriod>().unwrap(), ReportPeriod::Quarter);
        assert!("decade".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_margin_bps() {
        assert_eq!(margin_bps(1000, 700), 4285);
        assert_eq!(margin_bps(700, 700), 0);
        assert_eq!(margin_bps(500, 0), 0);
        assert_eq!(margin_bps(600, 800), -2500);
    }

    #[tokio::test]
    async fn test_sales_reports() {
        let db = fixtures::database().await;
        let pcm = fixtures::medicine(&db, "Paracetamol").await;
        let ibu = fixtures::medicine(&db, "Ibuprofen").await;
        let b1 = fixtures::batch(&db, pcm.id, "PCM-1", 100, 500, 200).await;
        let b2 = fixtures::batch(&db, ibu.id, "IBU-1", 100, 800, 200).await;

        sell(
            &db,
            "9000000001",
            PaymentMethod::Cash,
            vec![
                SaleLineRequest::new(b1.id, 4, Money::from_cents(500)),
                SaleLineRequest::new(b2.id, 1, Money::from_cents(800)),
            ],
        )
        .await;
        sell(
            &db,
            "9000000002",
            PaymentMethod::Upi,
            vec![SaleLineRequest::new(b1.id, 2, Money::from_cents(500))],
        )
        .await;

        let today = Utc::now().date_naive();
        let reports = db.reports();

        let summary = reports.sales_summary(ReportPeriod::Today, today).await.unwrap();
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.line_items, 3);
        assert_eq!(summary.units_sold, 7);
        assert_eq!(summary.revenue_cents, 2000 + 800 + 1000);
        assert_eq!(summary.unique_customers, 2);
        // (2000 + 800 + 1000) / 3 = 1266.67
        assert_eq!(summary.average_line_cents, 1267);

        let days = reports.daily_breakdown(ReportPeriod::Week, today).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, today);
        assert_eq!(days[0].revenue_cents, 3800);

        let top = reports.top_medicines(ReportPeriod::Month, today, 10).await.unwrap();
        assert_eq!(top[0].medicine_name, "Paracetamol");
        assert_eq!(top[0].units_sold, 6);
        assert_eq!(top[1].medicine_name, "Ibuprofen");

        let payments = reports.payment_breakdown(ReportPeriod::Today, today).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payment_method, PaymentMethod::Cash);
        assert_eq!(payments[0].revenue_cents, 2800);

        // A window that ended yesterday sees nothing
        let yesterday = today - Duration::days(1);
        let past = ReportPeriod::custom(yesterday - Duration::days(5), yesterday).unwrap();
        assert_eq!(reports.sales_summary(past, today).await.unwrap(), SalesSummary::default());
    }

    #[tokio::test]
    async fn test_inventory_and_expiry() {
        let db = fixtures::database().await;
        let today = fixtures::today();
        let pcm = fixtures::medicine(&db, "Paracetamol").await;
        let amox = fixtures::medicine(&db, "Amoxicillin").await;
        fixtures::medicine(&db, "Cetirizine").await;

        fixtures::batch(&db, pcm.id, "PCM-OLD", 10, 1000, -3).await;
        fixtures::batch(&db, pcm.id, "PCM-SOON", 10, 1000, 10).await;
        fixtures::batch(&db, amox.id, "AMX-MID", 20, 1000, 60).await;
        fixtures::batch(&db, amox.id, "AMX-FAR", 0, 1000, 400).await;

        let inv = db.reports().inventory_summary(today).await.unwrap();
        assert_eq!(inv.medicines, 3);
        assert_eq!(inv.batches, 3);
        assert_eq!(inv.total_units, 30);
        assert_eq!(inv.stock_value_cents, 30_000);
        assert_eq!(inv.cost_value_cents, 21_000);
        assert_eq!(inv.margin_bps, 4285);

        let buckets = db.reports().expiry_buckets(today).await.unwrap();
        assert_eq!(
            buckets,
            ExpiryBuckets {
                expired: 1,
                within_15_days: 1,
                within_90_days: 1,
                beyond_90_days: 1,
            }
        );
    }
}
