//! Token amounts.
//!
//! Amounts are raw smallest units held in `u128` to avoid floating-point
//! errors. Values scaled by 10^18 overflow JSON and TOML integers, so the
//! external surfaces carry them as decimal strings via [`decimal_string`].

use crate::error::TypesError;

/// Raw token amount in the token's smallest unit.
pub type Amount = u128;

/// Parse a base-10 amount string, allowing `_` digit separators.
pub fn parse_amount(raw: &str) -> Result<Amount, TypesError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypesError::InvalidAmount(raw.to_string()));
    }
    cleaned
        .parse::<u128>()
        .map_err(|_| TypesError::InvalidAmount(raw.to_string()))
}

/// Serde adapter that encodes an [`Amount`] as a decimal string.
///
/// Deserialization also accepts a bare integer for hand-written inputs.
pub mod decimal_string {
    use super::{parse_amount, Amount};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        struct AmountVisitor;

        impl<'v> Visitor<'v> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                parse_amount(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(v as Amount)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u128::try_from(v).map_err(|_| E::custom("amount must be non-negative"))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
