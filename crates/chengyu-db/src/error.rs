//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be converted back to a domain value.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<Error> for chengyu_engine::Error {
    fn from(err: Error) -> Self {
        chengyu_engine::Error::Storage(err.to_string())
    }
}
