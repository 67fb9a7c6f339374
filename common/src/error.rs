//! Error types shared across FxCalc crates.

use thiserror::Error;

/// Errors raised while constructing common types from untrusted input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Currency code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Direction name is not recognised.
    #[error("Invalid conversion direction: {0:?}")]
    InvalidDirection(String),

    /// Rate is not a positive finite number.
    #[error("Invalid rate: {0}")]
    InvalidRate(f64),
}

/// Result type alias for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;
