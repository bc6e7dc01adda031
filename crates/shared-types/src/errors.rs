//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors from parsing decimal amounts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Input is not a decimal number.
    #[error("Malformed amount: {input:?}")]
    Malformed { input: String },

    /// More fraction digits than the fixed scale supports.
    #[error("Too many fraction digits in {input:?}: maximum is {max}")]
    TooManyFractionDigits { input: String, max: usize },

    /// Value does not fit the minor-unit representation.
    #[error("Amount out of range: {input:?}")]
    Overflow { input: String },
}
