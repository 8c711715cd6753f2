use sea_orm::error::DbErr;
use serde::Serialize;

/// Error type shared by every engine service.
///
/// The variants mirror the failure taxonomy of the quantity lifecycle:
/// reference errors (`NotFound`), caller mistakes that are never retried
/// (`QuantityMismatch`, `ValidationError`, `InvalidStateTransition`),
/// stock shortfalls reported as partial fulfillment
/// (`InsufficientQuantity`), store failures (`DatabaseError`) and lost
/// optimistic-concurrency races (`ConcurrentModification`).
#[derive(thiserror::Error, Debug, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied quantities violate a conservation invariant.
    /// Terminal; resubmitting the same payload will fail the same way.
    #[error("Quantity mismatch: {0}")]
    QuantityMismatch(String),

    /// Demand exceeds what the stock can cover. Callers treat this as a
    /// shortage to accept or reject, not as a hard failure.
    #[error("Insufficient quantity: {0}")]
    InsufficientQuantity(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A concurrent writer updated the stock unit between our read and
    /// our version-guarded write, and retries were exhausted.
    #[error("Concurrent modification of stock unit {0}")]
    ConcurrentModification(i64),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn db_error(err: DbErr) -> Self {
        ServiceError::DatabaseError(err)
    }

    /// True for errors the caller can fix by correcting the request;
    /// false for transient store/concurrency failures worth retrying.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_)
                | ServiceError::QuantityMismatch(_)
                | ServiceError::InvalidStateTransition(_)
                | ServiceError::ValidationError(_)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}
