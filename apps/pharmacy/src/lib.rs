//! # pharmacy: Pharmacy Inventory Application
//!
//! The application layer over `pharma-core`, `pharma-db` and
//! `pharma-alerts`: configuration, the shared context, the error boundary
//! and the command functions front ends call.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pharmacy Application                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Front ends: `pharmacy` CLI, UI, polling badge client            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ commands::*(&ctx, ...)                  │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  commands   sale / alert / inventory / recommend / report        │  │
//! │  │             ApiResult<T>: errors mapped once, here               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppContext  Database + AlertEngine + AlertScheduler +           │  │
//! │  │              PharmacyConfig + SymptomClassifier                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - `pharmacy.toml` loading and environment overrides
//! - [`context`] - The shared application context
//! - [`commands`] - Operations exposed to front ends
//! - [`classifier`] - The symptom classifier seam
//! - [`error`] - API error boundary

use tracing_subscriber::EnvFilter;

pub mod classifier;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;

pub use config::PharmacyConfig;
pub use context::AppContext;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Verbose output
/// - `RUST_LOG=pharma_alerts=trace` - Trace the alert engine only
/// - Default: `info,pharma=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharma=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
