//! Fundamental types for the stakepool engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account and token identifiers, amounts, timestamps and the clock abstraction.

pub mod account;
pub mod amount;
pub mod error;
pub mod time;

pub use account::{AccountId, PoolId, TokenId};
pub use amount::{parse_amount, Amount};
pub use error::TypesError;
pub use time::{Clock, SystemClock, Timestamp, DAYS_PER_YEAR, SECS_PER_DAY};
