//! Error types for chengyu-core

use thiserror::Error;

/// Core error type
///
/// The four variants form the engine's whole error taxonomy:
/// lookups that miss, state-machine violations, malformed input,
/// and "nothing left to pick from" in no-repeat mode.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("exhausted: {0}")]
    Exhausted(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
