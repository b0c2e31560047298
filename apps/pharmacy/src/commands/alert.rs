//! # Alert Commands
//!
//! Listing and acknowledging alerts, plus the badge feed for the polling
//! client.
//!
//! ## Read Triggers Write
//! ```text
//! list_all_alerts ──► engine.scan_at(today) ──► alerts().list_all()
//!                          │
//!                          └── Err ──► warn!, the list is still returned
//!
//! list_unread_alerts / alert_badge never scan.
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::context::AppContext;
use crate::error::ApiResult;
use pharma_alerts::ScanReport;
use pharma_core::Alert;

/// Header badge: unread total plus the newest few.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AlertBadge {
    pub unread: i64,
    pub latest: Vec<Alert>,
}

/// Unread alerts, newest first.
pub async fn list_unread_alerts(ctx: &AppContext) -> ApiResult<Vec<Alert>> {
    Ok(ctx.db().alerts().list_unread().await?)
}

/// Runs a scan, then returns every alert, unread first and newest first.
pub async fn list_all_alerts(ctx: &AppContext) -> ApiResult<Vec<Alert>> {
    if let Err(e) = ctx.engine().scan_at(ctx.today()).await {
        warn!(error = %e, "Scan before listing alerts failed");
    }

    Ok(ctx.db().alerts().list_all().await?)
}

pub async fn mark_alert_read(ctx: &AppContext, id: i64) -> ApiResult<()> {
    ctx.db().alerts().mark_read(id).await?;
    debug!(id, "Alert acknowledged");
    Ok(())
}

/// Marks every unread alert read and returns how many changed.
pub async fn mark_all_alerts_read(ctx: &AppContext) -> ApiResult<u64> {
    Ok(ctx.db().alerts().mark_all_read().await?)
}

pub async fn unread_alert_count(ctx: &AppContext) -> ApiResult<i64> {
    Ok(ctx.db().alerts().unread_count().await?)
}

pub async fn alert_badge(ctx: &AppContext) -> ApiResult<AlertBadge> {
    let alerts = ctx.db().alerts();
    let latest = alerts
        .recent_unread(ctx.config().reports.unread_badge_limit)
        .await?;
    let unread = alerts.unread_count().await?;

    Ok(AlertBadge { unread, latest })
}

/// Runs one scan pass right now.
pub async fn run_alert_scan(ctx: &AppContext) -> ApiResult<ScanReport> {
    let report = ctx.engine().scan_at(ctx.today()).await?;
    info!(inserted = report.inserted(), "Manual alert scan finished");
    Ok(report)
}
