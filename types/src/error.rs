//! Errors raised by the value types in this crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid raw amount: {0:?}")]
    InvalidAmount(String),

    #[error("unsupported token decimals: {0}")]
    UnsupportedDecimals(u32),

    #[error("amount out of display range: {0}")]
    Overflow(String),
}
