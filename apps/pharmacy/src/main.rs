//! # pharmacy CLI
//!
//! Thin front end over the command layer. Every subcommand prints its
//! result as JSON on stdout; failures print the `ApiError` JSON on stderr
//! and exit with status 1.
//!
//! ## Usage
//! ```bash
//! pharmacy scan
//! pharmacy alerts --all
//! pharmacy ack 12
//! pharmacy ack --all
//! pharmacy sell --customer "Asha Rao" --phone 9845012345 --line 3:2:10.00 --line 7:1:5
//! pharmacy stock 4
//! pharmacy report summary --period week
//! pharmacy report sales --from 2026-03-01 --to 2026-03-31
//! pharmacy watch          # background alert scans until Ctrl-C
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use pharma_core::{CustomerInfo, Money, PaymentMethod, SaleLineRequest, SaleRequest, ValidationError};
use pharma_db::ReportPeriod;
use pharmacy::commands::{alert, inventory, recommend, report, sale};
use pharmacy::{init_tracing, ApiError, ApiResult, AppContext, PharmacyConfig};

/// Pharmacy inventory and alerting
#[derive(Debug, Parser)]
#[command(name = "pharmacy", version, about = "Pharmacy inventory, sales and stock alerts")]
struct Cli {
    /// Config file (defaults to pharmacy.toml in the platform config dir)
    #[arg(long, short, env = "PHARMA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one alert scan now
    Scan,

    /// List alerts (unread only unless --all)
    Alerts {
        /// Scan first, then list read and unread alerts
        #[arg(long)]
        all: bool,

        /// Only the unread count and the newest few
        #[arg(long, conflicts_with = "all")]
        badge: bool,
    },

    /// Mark an alert read, or every alert with --all
    Ack {
        #[arg(required_unless_present = "all")]
        id: Option<i64>,

        #[arg(long)]
        all: bool,
    },

    /// Record a sale
    Sell {
        #[arg(long)]
        customer: String,

        #[arg(long)]
        phone: String,

        /// cash, card, upi or insurance
        #[arg(long, default_value = "cash")]
        payment: String,

        /// BATCH_ID:QTY:UNIT_PRICE, repeatable
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },

    /// Show a medicine with its batches and what can be sold today
    Stock { medicine_id: i64 },

    /// Search medicines by name, category or composition
    Search { query: String },

    /// Build a report table: summary, sales, top, inventory or expiry
    Report {
        kind: String,

        /// today, week, month, quarter or year
        #[arg(long, default_value = "month", conflicts_with_all = ["from", "to"])]
        period: String,

        /// Custom period start (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Custom period end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Suggest medicines for free-text symptoms
    Recommend { symptoms: String },

    /// Check two drugs for a known interaction
    Interaction { drug_a: String, drug_b: String },

    /// Start the background alert scheduler and run until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let config = match PharmacyConfig::load(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = match AppContext::build(config).await {
        Ok(ctx) => ctx,
        Err(e) => return fail(e),
    };

    let outcome = run(&ctx, cli.command).await;
    ctx.shutdown().await;

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

async fn run(ctx: &AppContext, command: Command) -> ApiResult<()> {
    match command {
        Command::Scan => print(&alert::run_alert_scan(ctx).await?),

        Command::Alerts { all: true, .. } => print(&alert::list_all_alerts(ctx).await?),
        Command::Alerts { badge: true, .. } => print(&alert::alert_badge(ctx).await?),
        Command::Alerts { .. } => print(&alert::list_unread_alerts(ctx).await?),

        Command::Ack { all: true, .. } => {
            let changed = alert::mark_all_alerts_read(ctx).await?;
            print(&serde_json::json!({ "marked_read": changed }))
        }
        Command::Ack { id: Some(id), .. } => {
            alert::mark_alert_read(ctx, id).await?;
            print(&serde_json::json!({ "marked_read": 1 }))
        }
        Command::Ack { id: None, .. } => Err(ApiError::validation("alert id or --all is required")),

        Command::Sell {
            customer,
            phone,
            payment,
            lines,
        } => {
            let mut buyer = CustomerInfo::new(customer, phone);
            buyer.payment_method = payment.parse::<PaymentMethod>()?;

            let lines = lines
                .iter()
                .map(|l| parse_line(l))
                .collect::<Result<Vec<_>, _>>()?;

            let receipt = sale::create_sale(
                ctx,
                SaleRequest {
                    customer: buyer,
                    lines,
                },
            )
            .await?;
            print(&receipt)
        }

        Command::Stock { medicine_id } => {
            let detail = inventory::get_medicine(ctx, medicine_id).await?;
            let sellable = inventory::sellable_batches(ctx, medicine_id).await?;
            print(&serde_json::json!({ "medicine": detail, "sellable": sellable }))
        }

        Command::Search { query } => print(&inventory::search_medicines(ctx, &query, None).await?),

        Command::Report {
            kind,
            period,
            from,
            to,
        } => {
            let kind = kind.parse::<report::ReportKind>()?;
            let period = match (from, to) {
                (Some(start), Some(end)) => ReportPeriod::custom(start, end)?,
                _ => period.parse::<ReportPeriod>()?,
            };
            print(&report::build_report(ctx, kind, period).await?)
        }

        Command::Recommend { symptoms } => print(&recommend::recommend(ctx, &symptoms).await?),

        Command::Interaction { drug_a, drug_b } => {
            print(&inventory::check_interaction(ctx, &drug_a, &drug_b).await?)
        }

        Command::Watch => {
            // Stands in for the first sign-in of an interactive session
            ctx.on_authenticated().await;
            info!("Watching inventory, press Ctrl-C to stop");
            shutdown_signal().await;
            Ok(())
        }
    }
}

/// Parses `BATCH_ID:QTY:UNIT_PRICE`, e.g. `3:2:10.00`.
fn parse_line(raw: &str) -> Result<SaleLineRequest, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "line".to_string(),
        reason: format!("expected BATCH_ID:QTY:UNIT_PRICE, got '{}'", raw),
    };

    let mut parts = raw.split(':');
    let (Some(batch), Some(qty), Some(price), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let batch_id = batch.trim().parse::<i64>().map_err(|_| invalid())?;
    let quantity = qty.trim().parse::<i64>().map_err(|_| invalid())?;
    let unit_price = price.parse::<Money>()?;

    Ok(SaleLineRequest::new(batch_id, quantity, unit_price))
}

fn print<T: Serialize>(value: &T) -> ApiResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn fail(err: ApiError) -> ExitCode {
    match serde_json::to_string_pretty(&err) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = parse_line("3:2:10.00").unwrap();
        assert_eq!(line, SaleLineRequest::new(3, 2, Money::from_cents(1000)));

        let line = parse_line("7:1:5").unwrap();
        assert_eq!(line.unit_price_cents, 500);

        assert!(parse_line("3:2").is_err());
        assert!(parse_line("3:2:1:0").is_err());
        assert!(parse_line("x:2:10").is_err());
        assert!(parse_line("3:2:ten").is_err());
    }

    #[test]
    fn test_cli_shape() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["pharmacy", "ack", "--all"]).unwrap();
        assert!(matches!(cli.command, Command::Ack { all: true, id: None }));

        assert!(Cli::try_parse_from(["pharmacy", "ack"]).is_err());
        assert!(Cli::try_parse_from(["pharmacy", "sell", "--customer", "A", "--phone", "1"]).is_err());
    }
}
