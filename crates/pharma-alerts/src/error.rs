//! # Alert Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Alert Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Database     │  │      Scheduler          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Database       │  │  AlreadyRunning         │ │
//! │  │                 │  │  (DbError)      │  │  ChannelError           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Notification   │   Logged by the engine, never fails a scan.       │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pharma_db::DbError;
use thiserror::Error;

/// Result type alias for alert operations.
pub type AlertResult<T> = Result<T, AlertError>;

#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid alert settings.
    #[error("Invalid alert configuration: {0}")]
    InvalidConfig(String),

    /// Reading inventory or writing alerts failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// A notifier could not deliver a summary.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// The scheduler loop has already been started.
    #[error("Alert scheduler is already running")]
    AlreadyRunning,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl AlertError {
    /// Returns true if the next scan may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            AlertError::Database(err) => err.is_persistence(),
            AlertError::Notification(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AlertError::Database(DbError::PoolExhausted).is_retryable());
        assert!(AlertError::Notification("smtp down".into()).is_retryable());
        assert!(!AlertError::InvalidConfig("bad".into()).is_retryable());
        assert!(!AlertError::AlreadyRunning.is_retryable());
    }

    #[test]
    fn test_database_error_is_transparent() {
        let err: AlertError = DbError::ConnectionFailed("locked".into()).into();
        assert_eq!(err.to_string(), DbError::ConnectionFailed("locked".into()).to_string());
    }
}
