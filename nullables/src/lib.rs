//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern.
//! The engine's external dependencies (clock, token ledger) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Can be told to fail on demand
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod token;

pub use clock::NullClock;
pub use token::{NullTokenLedger, TransferCall};
