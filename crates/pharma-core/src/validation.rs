//! # Validation Module
//!
//! Input validation for inventory administration and sale requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command boundary (apps/pharmacy)                             │
//! │  ├── Type validation (deserialization, CLI parsing)                    │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Sale transaction (pharma-db)                                 │
//! │  └── Conditional decrement: stock is checked inside the write          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  ├── UNIQUE (batch_no)                                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock availability is deliberately absent here: it can only be decided
//! inside the transaction that consumes it.
//!
//! ## Usage
//! ```rust
//! use pharma_core::validation::{validate_batch_no, validate_quantity};
//!
//! validate_batch_no("PCM-2401").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerInfo, MedicineInput, NewBatch, SaleRequest};
use crate::money::Money;
use crate::MAX_SALE_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

fn check_optional(field: &str, value: &Option<String>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) => check_length(field, v.trim(), max),
        None => Ok(()),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a medicine name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use pharma_core::validation::validate_medicine_name;
///
/// assert!(validate_medicine_name("Paracetamol 500mg").is_ok());
/// assert!(validate_medicine_name("   ").is_err());
/// ```
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required("name"));
    }

    check_length("name", name, 200)
}

/// Validates a batch number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores and slashes only
pub fn validate_batch_no(batch_no: &str) -> ValidationResult<()> {
    let batch_no = batch_no.trim();

    if batch_no.is_empty() {
        return Err(required("batch_no"));
    }

    check_length("batch_no", batch_no, 50)?;

    if !batch_no
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_no".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores and slashes"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    check_length("query", query, 100)?;
    Ok(query.to_string())
}

/// Validates free-text symptoms for the recommender.
pub fn validate_symptoms(symptoms: &str) -> ValidationResult<String> {
    let symptoms = symptoms.trim();

    if symptoms.is_empty() {
        return Err(required("symptoms"));
    }

    check_length("symptoms", symptoms, 1000)?;
    Ok(symptoms.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Counter Workflow
/// ```text
/// Pharmacist enters quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?      → Error: "quantity must be positive"
///      └── OK             → line goes into the sale request
/// ```
/// There is no upper bound here; the batch's stock is the bound.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a price in cents. Zero is allowed (free samples).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0 to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a medicine create/update payload.
pub fn validate_medicine_input(input: &MedicineInput) -> ValidationResult<()> {
    validate_medicine_name(&input.name)?;
    check_optional("composition", &input.composition, 500)?;
    check_optional("uses", &input.uses, 1000)?;
    check_optional("dosage", &input.dosage, 500)?;
    check_optional("side_effects", &input.side_effects, 1000)?;
    check_optional("category", &input.category, 100)?;
    Ok(())
}

/// Validates a batch about to be received into stock.
///
/// ## Rules
/// - Batch number well-formed
/// - Quantity zero or more (an empty batch can be registered ahead of delivery)
/// - Prices not negative
/// - Manufacturing date not after expiry date
pub fn validate_new_batch(batch: &NewBatch) -> ValidationResult<()> {
    validate_batch_no(&batch.batch_no)?;

    if batch.quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    validate_price_cents("mrp", batch.mrp_cents)?;
    validate_price_cents("cost_price", batch.cost_price_cents)?;
    check_optional("supplier", &batch.supplier, 200)?;

    if let Some(mfg) = batch.mfg_date {
        if mfg > batch.expiry_date {
            return Err(ValidationError::Mismatch {
                field: "mfg_date".to_string(),
                reason: "must not be after expiry_date".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates the customer block of a sale.
///
/// Name and phone are mandatory; the phone is free text (extensions,
/// landline notes). Age, when given, must be plausible.
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult<()> {
    let name = customer.name.trim();
    if name.is_empty() {
        return Err(required("customer_name"));
    }
    check_length("customer_name", name, 200)?;

    let phone = customer.phone.trim();
    if phone.is_empty() {
        return Err(required("customer_phone"));
    }
    check_length("customer_phone", phone, 50)?;

    if let Some(age) = customer.age {
        if !(0..=150).contains(&age) {
            return Err(ValidationError::OutOfRange {
                field: "customer_age".to_string(),
                min: 0,
                max: 150,
            });
        }
    }

    check_optional("prescription_number", &customer.prescription_number, 100)?;
    check_optional("doctor_name", &customer.doctor_name, 200)?;
    check_optional("diagnosis", &customer.diagnosis, 1000)?;

    Ok(())
}

/// Validates a complete sale request before any stock is touched.
///
/// ## Rules
/// - Customer block valid
/// - 1 to MAX_SALE_LINES lines
/// - Every line: positive quantity, non-negative unit price
/// - Line totals and their sum fit the ledger (`TooLarge` otherwise)
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<()> {
    validate_customer(&request.customer)?;

    if request.lines.is_empty() {
        return Err(required("lines"));
    }

    if request.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    let mut subtotal = Money::zero();
    for line in &request.lines {
        validate_quantity(line.quantity)?;
        validate_price_cents("unit_price", line.unit_price_cents)?;

        subtotal = line
            .unit_price()
            .checked_multiply_quantity(line.quantity)
            .and_then(|total| subtotal.checked_add(total))
            .ok_or_else(|| ValidationError::TooLarge {
                field: "subtotal".to_string(),
            })?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
