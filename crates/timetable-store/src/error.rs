use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures. Any of these inside an import rolls the import back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid row {id}: {message}")]
    InvalidRow { id: i64, message: String },

    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn invalid_row(id: i64, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            id,
            message: message.into(),
        }
    }
}
