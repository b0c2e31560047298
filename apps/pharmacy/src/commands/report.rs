//! # Report Commands
//!
//! Builds plain tables for the export collaborator. Rendering to CSV,
//! spreadsheet or PDF happens elsewhere; this module only supplies headers,
//! rows and metadata.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportKind      Source                          Period used?          │
//! │  ─────────────   ─────────────────────────────   ────────────          │
//! │  Summary         sales_summary + payments +      yes                   │
//! │                  inventory_summary                                     │
//! │  Sales           daily_breakdown                 yes                   │
//! │  TopMedicines    top_medicines(limit)            yes                   │
//! │  Inventory       list_with_stock                 no                    │
//! │  Expiry          expiry_buckets                  no                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are bucketed by the UTC date they were recorded on, so sales
//! periods are resolved against the UTC calendar date.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use ts_rs::TS;

use crate::context::AppContext;
use crate::error::ApiResult;
use pharma_core::{Money, ValidationError};
use pharma_db::ReportPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReportKind {
    Summary,
    Sales,
    TopMedicines,
    Inventory,
    Expiry,
}

impl ReportKind {
    fn uses_period(&self) -> bool {
        matches!(
            self,
            ReportKind::Summary | ReportKind::Sales | ReportKind::TopMedicines
        )
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(ReportKind::Summary),
            "sales" => Ok(ReportKind::Sales),
            "top" | "top_medicines" => Ok(ReportKind::TopMedicines),
            "inventory" => Ok(ReportKind::Inventory),
            "expiry" => Ok(ReportKind::Expiry),
            other => Err(ValidationError::InvalidFormat {
                field: "report".to_string(),
                reason: format!(
                    "unknown report '{}', expected summary, sales, top, inventory or expiry",
                    other
                ),
            }),
        }
    }
}

/// Tabular report handed to the export collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportTable {
    pub title: String,
    /// `None` for point-in-time reports.
    pub period_label: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// RFC 3339, UTC.
    pub generated_at: String,
}

impl ReportTable {
    fn new(title: &str, period: Option<&ReportPeriod>, headers: &[&str]) -> Self {
        ReportTable {
            title: title.to_string(),
            period_label: period.map(ReportPeriod::label),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    fn push<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows.push(cells.into_iter().map(|c| c.to_string()).collect());
    }
}

fn money(cents: i64) -> String {
    Money::from_cents(cents).to_string()
}

/// Percentage with two decimals from basis points: 4286 → "42.86%".
fn percent(bps: i64) -> String {
    format!("{}%", Money::from_cents(bps))
}

pub async fn build_report(
    ctx: &AppContext,
    kind: ReportKind,
    period: ReportPeriod,
) -> ApiResult<ReportTable> {
    debug!(?kind, ?period, "build_report command");

    let reports = ctx.db().reports();
    let sales_day = Utc::now().date_naive();
    let period_ref = kind.uses_period().then_some(&period);

    let table = match kind {
        ReportKind::Summary => {
            let sales = reports.sales_summary(period, sales_day).await?;
            let payments = reports.payment_breakdown(period, sales_day).await?;
            let stock = reports.inventory_summary(ctx.today()).await?;

            let mut table = ReportTable::new("Sales & Inventory Summary", period_ref, &["Metric", "Value"]);
            table.push(["Transactions".to_string(), sales.transactions.to_string()]);
            table.push(["Line items".to_string(), sales.line_items.to_string()]);
            table.push(["Units sold".to_string(), sales.units_sold.to_string()]);
            table.push(["Revenue".to_string(), money(sales.revenue_cents)]);
            table.push(["Unique customers".to_string(), sales.unique_customers.to_string()]);
            table.push(["Average line value".to_string(), money(sales.average_line_cents)]);
            for p in &payments {
                table.push([format!("Revenue ({})", p.payment_method), money(p.revenue_cents)]);
            }
            table.push(["Medicines".to_string(), stock.medicines.to_string()]);
            table.push(["Sellable batches".to_string(), stock.batches.to_string()]);
            table.push(["Units in stock".to_string(), stock.total_units.to_string()]);
            table.push(["Stock value (MRP)".to_string(), money(stock.stock_value_cents)]);
            table.push(["Stock value (cost)".to_string(), money(stock.cost_value_cents)]);
            table.push(["Margin".to_string(), percent(stock.margin_bps)]);
            table
        }

        ReportKind::Sales => {
            let days = reports.daily_breakdown(period, sales_day).await?;
            let mut table = ReportTable::new(
                "Daily Sales",
                period_ref,
                &["Date", "Transactions", "Units", "Revenue"],
            );
            for d in days {
                table.push([
                    d.day.to_string(),
                    d.transactions.to_string(),
                    d.units_sold.to_string(),
                    money(d.revenue_cents),
                ]);
            }
            table
        }

        ReportKind::TopMedicines => {
            let limit = ctx.config().reports.top_medicines_limit;
            let top = reports.top_medicines(period, sales_day, limit).await?;
            let mut table = ReportTable::new(
                "Top Selling Medicines",
                period_ref,
                &["Rank", "Medicine", "Units", "Revenue"],
            );
            for (rank, m) in top.into_iter().enumerate() {
                table.push([
                    (rank + 1).to_string(),
                    m.medicine_name,
                    m.units_sold.to_string(),
                    money(m.revenue_cents),
                ]);
            }
            table
        }

        ReportKind::Inventory => {
            let medicines = ctx.db().medicines().list_with_stock().await?;
            let mut table = ReportTable::new(
                "Inventory",
                None,
                &["ID", "Medicine", "Category", "Batches", "Total Stock"],
            );
            for m in medicines {
                table.push([
                    m.id.to_string(),
                    m.name,
                    m.category.unwrap_or_default(),
                    m.batch_count.to_string(),
                    m.total_stock.to_string(),
                ]);
            }
            table
        }

        ReportKind::Expiry => {
            let buckets = reports.expiry_buckets(ctx.today()).await?;
            let mut table = ReportTable::new("Batch Expiry", None, &["Window", "Batches"]);
            table.push(["Expired".to_string(), buckets.expired.to_string()]);
            table.push(["0-15 days".to_string(), buckets.within_15_days.to_string()]);
            table.push(["16-90 days".to_string(), buckets.within_90_days.to_string()]);
            table.push(["Over 90 days".to_string(), buckets.beyond_90_days.to_string()]);
            table
        }
    };

    Ok(table)
}
