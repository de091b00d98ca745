//! Error types for the subscribers domain.

use thiserror::Error;

/// Result type for recipient store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a recipient store or the subscription service.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No subscriber is registered under this address.
    #[error("Subscriber not found: {0}")]
    NotFound(String),

    /// An active subscriber already uses this address.
    #[error("Email already subscribed: {0}")]
    DuplicateEmail(String),

    /// Input rejected before reaching the store.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Query or connectivity failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        StoreError::Validation(err.to_string())
    }
}
