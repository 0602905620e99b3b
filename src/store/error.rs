use thiserror::Error;

/// Errors raised by the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (pool exhausted, connection refused, ...).
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A statement ran but failed.
    #[error("store query failed: {reason}")]
    QueryFailed { reason: String },

    /// A row could not be mapped back into a domain value.
    #[error("corrupt row in '{table}': {reason}")]
    CorruptRow { table: &'static str, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable {
                reason: err.to_string(),
            },
            other => StoreError::QueryFailed {
                reason: other.to_string(),
            },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
