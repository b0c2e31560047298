//! # API Error Type
//!
//! The request boundary. Every command returns `Result<T, ApiError>`.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Pharmacy App                       │
//! │                                                                         │
//! │  Command Function  ──►  Result<T, ApiError>                             │
//! │         │                                                               │
//! │         ├── ValidationError        ──► VALIDATION_ERROR (verbatim)      │
//! │         ├── NotFound               ──► NOT_FOUND                        │
//! │         ├── InsufficientStock      ──► INSUFFICIENT_STOCK               │
//! │         ├── DuplicateBatchNumber   ──► DUPLICATE_BATCH_NUMBER           │
//! │         ├── MedicineHasSales       ──► BUSINESS_LOGIC                   │
//! │         └── store failure          ──► DATABASE_ERROR                   │
//! │                                         (error! logged, generic text)   │
//! │                                                                         │
//! │  ClassifierUnavailable never reaches here: recommendations degrade     │
//! │  to an empty list inside the command.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use pharma_alerts::AlertError;
use pharma_core::{CoreError, ValidationError};
use pharma_db::DbError;

/// Result type alias for commands.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from commands.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for batch PCM-24B07: available 12, requested 15"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced medicine, batch, alert or sale does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Not enough units left in a batch
    InsufficientStock,

    /// Batch number already registered
    DuplicateBatchNumber,

    /// A business rule refused the operation
    BusinessLogic,

    /// Store-level failure
    DatabaseError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    fn database(message: &str) -> Self {
        ApiError::new(ErrorCode::DatabaseError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::database("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::database("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::database("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::database("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::database("Database is busy, try again"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::database("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            err @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            err @ CoreError::DuplicateBatchNumber(_) => {
                ApiError::new(ErrorCode::DuplicateBatchNumber, err.to_string())
            }
            err @ CoreError::MedicineHasSales { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::ClassifierUnavailable(reason) => {
                tracing::error!("Classifier error reached the boundary: {}", reason);
                ApiError::internal("Recommendations are unavailable")
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::Database(e) => ApiError::from(e),
            AlertError::InvalidConfig(msg) => ApiError::validation(msg),
            other => {
                tracing::error!("Alert error: {}", other);
                ApiError::internal("Alert processing failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_keeps_detail() {
        let err = ApiError::from(DbError::Rejected(CoreError::InsufficientStock {
            batch_no: "PCM-24B07".into(),
            available: 12,
            requested: 15,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("PCM-24B07"));
        assert!(err.message.contains("12"));
        assert!(err.message.contains("15"));
    }

    #[test]
    fn test_persistence_detail_is_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such table: batches".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("batches"));
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let inner = ValidationError::Required {
            field: "customer_name".into(),
        };
        let expected = inner.to_string();
        let err = ApiError::from(CoreError::Validation(inner));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, expected);
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let err = ApiError::new(ErrorCode::DuplicateBatchNumber, "dup");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"DUPLICATE_BATCH_NUMBER\""));
    }

    #[test]
    fn test_alert_database_errors_map_through() {
        let err = ApiError::from(AlertError::Database(DbError::not_found("Alert", 7)));
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
