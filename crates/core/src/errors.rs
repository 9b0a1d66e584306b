//! Core error types for the valuation engine.
//!
//! The engine is deliberately forgiving: a half-filled trade form must never
//! crash a recalculation, so most degenerate inputs degrade to zero instead
//! of erroring. The errors defined here cover the remaining cases — data
//! integrity bugs (an unrecognizable month token) and rejected mutations.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the valuation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

#[derive(Error, Debug)]
pub enum CalculatorError {
    /// A month token could not be normalized to Jan..Dec. This indicates a
    /// data-integrity bug upstream; callers must not attempt recovery.
    #[error("Invalid month token: '{0}'")]
    InvalidMonth(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}

// Add From implementation for rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

// Add From implementation for serde_json::Error
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}
