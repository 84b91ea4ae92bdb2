use thiserror::Error;

/// Store failures split by recoverability. Transient errors (pool exhaustion,
/// connection loss, I/O) are retried once by the pipeline; fatal errors abort
/// the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transient database error: {0}")]
    Transient(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Fatal(#[source] sqlx::Error),

    #[error("row not found")]
    NotFound,
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(err),
            _ => StoreError::Fatal(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
