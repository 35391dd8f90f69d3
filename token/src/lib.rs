//! Fungible-token ledger used for escrow and payouts.
//!
//! The staking engine never moves value itself. It depends only on the
//! [`TokenLedger`] trait; [`MemoryTokenLedger`] is the in-process
//! implementation used by the daemon and by tests.

pub mod error;
pub mod ledger;
pub mod memory;

pub use error::TransferError;
pub use ledger::TokenLedger;
pub use memory::MemoryTokenLedger;
