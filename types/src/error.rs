//! Errors raised while constructing fundamental types from untrusted input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),

    #[error("{kind} identifier is {len} bytes, maximum is {max}")]
    IdentifierTooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
