use mediaconv_core::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Media item {0} not found")]
    NotFound(Uuid),

    /// A concurrent writer won; the caller may retry.
    #[error("Conflicting concurrent write: {0}")]
    Conflict(String),

    /// The job's claim was released or taken over while it ran.
    #[error("Claim on job {0} was lost")]
    ClaimLost(Uuid),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

// Serialization failure, deadlock, unique violation
const CONFLICT_SQLSTATES: [&str; 3] = ["40001", "40P01", "23505"];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if CONFLICT_SQLSTATES.iter().any(|state| code == *state) {
                    return StoreError::Conflict(db_err.message().to_string());
                }
            }
        }
        StoreError::Database(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("Media {} not found", id)),
            StoreError::Conflict(_) | StoreError::ClaimLost(_) => {
                AppError::StoreWrite(err.to_string())
            }
            StoreError::Corrupt(msg) => AppError::Internal(msg),
            StoreError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
