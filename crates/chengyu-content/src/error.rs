//! Error types for chengyu-content

use thiserror::Error;

/// Content loading error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("duplicate question: {0}")]
    DuplicateQuestion(String),

    #[error("invalid question {id}: {reason}")]
    InvalidQuestion { id: String, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
