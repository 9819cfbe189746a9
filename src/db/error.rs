use thiserror::Error;

/// Store-level errors. Read misses are not errors; lookups return
/// `Ok(None)` and searches return empty pages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record failed a precondition. Nothing was written.
    #[error("invalid record: {0}")]
    Validation(String),

    /// The write would contradict existing identity mappings, e.g. two rows
    /// claiming one natural key. Nothing was written.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation's cancellation token fired between steps. Any open
    /// transaction was rolled back.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying database failure, surfaced as-is. Callers decide whether
    /// to retry; the store never does.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<sea_orm::TransactionError<StoreError>> for StoreError {
    fn from(err: sea_orm::TransactionError<StoreError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(e) => Self::Database(e),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}
