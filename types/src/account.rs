//! Account and token identifiers.
//!
//! Both are opaque strings assigned by the token ledger; the engine only
//! compares and hashes them.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on identifier length accepted by [`AccountId::parse`] and
/// [`TokenId::parse`].
pub const MAX_ID_LEN: usize = 128;

fn validate(kind: &'static str, raw: &str) -> Result<(), TypesError> {
    if raw.trim().is_empty() {
        return Err(TypesError::EmptyIdentifier(kind));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(TypesError::IdentifierTooLong {
            kind,
            len: raw.len(),
            max: MAX_ID_LEN,
        });
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(TypesError::InvalidIdentifier {
            kind,
            value: raw.to_string(),
        });
    }
    Ok(())
}

/// An account holding tokens and stake positions.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account id from a trusted raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Create an account id from untrusted input.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        validate("account", raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Return the raw account string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a fungible token on the token ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        validate("token", raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Sequential pool identifier, assigned at creation starting from 0.
pub type PoolId = u64;
