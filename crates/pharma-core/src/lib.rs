//! # pharma-core: Pure Domain Logic for the Pharmacy
//!
//! This crate holds the records, money math, validation and alert rules of
//! the pharmacy inventory system. Nothing in here touches the database, the
//! network or the clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pharmacy Inventory Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              apps/pharmacy (context, commands, CLI)             │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐ ┌─────────────▼───────────────────┐   │
//! │  │  pharma-db                  │ │  pharma-alerts                  │   │
//! │  │  repositories, sale tx      │ │  AlertEngine, AlertScheduler    │   │
//! │  └──────────────┬──────────────┘ └─────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ pharma-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌─────────┐         │   │
//! │  │   │  types  │  │  money  │  │ validation │  │  rules  │         │   │
//! │  │   │Medicine │  │  Money  │  │  checks    │  │ low/exp │         │   │
//! │  │   │ Batch   │  │ TaxRate │  │            │  │ receipt │         │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └─────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Medicine, Batch, Sale, Alert and their request/receipt shapes
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for admin and sale requests
//! - [`rules`] - Low-stock and expiry alert rules, dedup key
//! - [`receipt`] - Receipt totals for a sale transaction
//!
//! ## Example Usage
//!
//! ```rust
//! use pharma_core::money::Money;
//! use pharma_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(2500); // 25.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(500)); // 5%
//! assert_eq!(tax.cents(), 125);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod receipt;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to every receipt: 500 bps = 5%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 500;

/// Maximum number of lines accepted in one sale request.
pub const MAX_SALE_LINES: usize = 100;
