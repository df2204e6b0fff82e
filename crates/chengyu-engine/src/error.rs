//! Error types for chengyu-engine

use thiserror::Error;

/// Engine error type
///
/// Validation and state errors surface as [`chengyu_core::Error`];
/// the engine adds the failure modes of its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] chengyu_core::Error),

    #[error("content error: {0}")]
    Content(#[from] chengyu_content::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
