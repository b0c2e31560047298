//! # Error Types
//!
//! Domain-specific error types for pharma-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharma-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharma-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, wraps CoreError rejections     │
//! │                                                                         │
//! │  pharmacy app errors                                                   │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Everything except `ClassifierUnavailable` is recovered at the request
/// boundary and turned into a user-facing message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced Medicine, Batch, Alert or Sale does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough units left in a batch to cover a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 15 × PCM-2401
    ///      │
    ///      ▼
    /// Batch PCM-2401 has 12 units
    ///      │
    ///      ▼
    /// InsufficientStock { batch_no: "PCM-2401", available: 12, requested: 15 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, counter shows "Only 12 left in PCM-2401"
    /// ```
    #[error("Insufficient stock for batch {batch_no}: available {available}, requested {requested}")]
    InsufficientStock {
        batch_no: String,
        available: i64,
        requested: i64,
    },

    /// A batch number is already registered.
    #[error("Batch number '{0}' already exists")]
    DuplicateBatchNumber(String),

    /// A medicine cannot be removed while sales still reference its batches.
    #[error("Medicine {medicine_id} has {sales} recorded sales and cannot be deleted")]
    MedicineHasSales { medicine_id: i64, sales: i64 },

    /// The symptom classifier is not loaded or failed.
    #[error("Recommendation model unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Messages are user-correctable and surfaced verbatim.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount does not fit in the ledger's integer range.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable date or sale line).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields contradict each other.
    #[error("{field} {reason}")]
    Mismatch { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            batch_no: "PCM-2401".to_string(),
            available: 12,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for batch PCM-2401: available 12, requested 15"
        );

        let err = CoreError::not_found("Batch", 42);
        assert_eq!(err.to_string(), "Batch not found: 42");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "batch_no".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
